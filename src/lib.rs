//! Treesync: One-way Directory Mirroring
//!
//! Periodically mirrors a source directory tree onto a target tree. Files are
//! compared by content fingerprint, new and changed files are copied with
//! their permissions and timestamps, and target paths missing from source are
//! pruned.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod sync;
pub mod tree;
pub mod types;
