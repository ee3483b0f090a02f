//! Read-only side of mirroring
//!
//! Fingerprinting, content comparison, traversal and path mapping. Nothing in
//! this module mutates the filesystem.

pub mod compare;
pub mod hasher;
pub mod path;
pub mod walker;
