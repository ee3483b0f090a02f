//! Core types for the tree mirroring engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Digest: Generic 256-bit hash value
pub type Digest = [u8; 32];

/// Kind of a filesystem entry, as seen without following symbolic links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Sockets, FIFOs, device nodes
    Other,
}

impl EntryKind {
    pub fn from_file_type(file_type: std::fs::FileType) -> Self {
        if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

/// A path found during traversal, relative to the root it was found under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub relative: PathBuf,
    pub kind: EntryKind,
}

/// Per-path outcome of comparing source against target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileDecision {
    /// Target path does not exist
    Create,
    /// Target exists with different content
    Update,
    /// Target has identical content
    Unchanged,
    /// Target path has no counterpart in source
    Delete,
}

impl ReconcileDecision {
    /// Whether this decision requires the Copier
    pub fn needs_copy(self) -> bool {
        matches!(self, ReconcileDecision::Create | ReconcileDecision::Update)
    }
}

/// What to do when a single file fails during a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// First failure aborts the rest of the cycle
    #[default]
    Abort,
    /// Log the failure, count it and keep going
    Isolate,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(FailurePolicy::Abort),
            "isolate" => Ok(FailurePolicy::Isolate),
            other => Err(format!(
                "Invalid failure policy: {} (must be 'abort' or 'isolate')",
                other
            )),
        }
    }
}

/// Action counts for one reconcile cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub created: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub removed_files: u64,
    pub removed_dirs: u64,
    pub failures: u64,
}

impl SyncStats {
    /// Number of mutating actions applied to the target
    pub fn actions(&self) -> u64 {
        self.created + self.updated + self.removed_files + self.removed_dirs
    }

    pub fn record(&mut self, decision: ReconcileDecision) {
        match decision {
            ReconcileDecision::Create => self.created += 1,
            ReconcileDecision::Update => self.updated += 1,
            ReconcileDecision::Unchanged => self.unchanged += 1,
            ReconcileDecision::Delete => self.removed_files += 1,
        }
    }
}

/// Outcome of one full reconcile pass, for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncCycleResult {
    pub elapsed: Duration,
    pub stats: SyncStats,
}
