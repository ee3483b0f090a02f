//! Sync events and the sinks that receive them.
//!
//! Core components never log directly. They report what they did to an
//! injected [`EventSink`]; the binary plugs in [`TracingSink`], tests plug in
//! [`MemorySink`] and assert on the recorded events.

use crate::types::SyncStats;
use parking_lot::Mutex;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Severity of an event, mapped onto tracing levels by [`TracingSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

/// Observable side effect or condition during a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    TargetRootCreated { path: PathBuf },
    DirectoryCreated { path: PathBuf },
    FileCreated { source: PathBuf, target: PathBuf },
    FileUpdated { source: PathBuf, target: PathBuf },
    FileRemoved { path: PathBuf },
    DirectoryRemoved { path: PathBuf },
    SourceMissing { path: PathBuf },
    /// Target holds a directory where source holds something else
    TypeMismatch { source: PathBuf, target: PathBuf },
    /// Only emitted under the isolate failure policy
    FileFailed { path: PathBuf, error: String },
    CycleCompleted { elapsed: Duration, stats: SyncStats },
}

impl SyncEvent {
    pub fn level(&self) -> EventLevel {
        match self {
            SyncEvent::SourceMissing { .. } | SyncEvent::FileFailed { .. } => EventLevel::Error,
            SyncEvent::TypeMismatch { .. } => EventLevel::Warn,
            _ => EventLevel::Info,
        }
    }

    /// Short machine-readable name, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            SyncEvent::TargetRootCreated { .. } => "target_root_created",
            SyncEvent::DirectoryCreated { .. } => "directory_created",
            SyncEvent::FileCreated { .. } => "file_created",
            SyncEvent::FileUpdated { .. } => "file_updated",
            SyncEvent::FileRemoved { .. } => "file_removed",
            SyncEvent::DirectoryRemoved { .. } => "directory_removed",
            SyncEvent::SourceMissing { .. } => "source_missing",
            SyncEvent::TypeMismatch { .. } => "type_mismatch",
            SyncEvent::FileFailed { .. } => "file_failed",
            SyncEvent::CycleCompleted { .. } => "cycle_completed",
        }
    }
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncEvent::TargetRootCreated { path } => {
                write!(f, "Target directory {} does not exist. Created", path.display())
            }
            SyncEvent::DirectoryCreated { path } => {
                write!(f, "Created directory: {}", path.display())
            }
            SyncEvent::FileCreated { target, .. } => {
                write!(f, "Creating file: {}", target.display())
            }
            SyncEvent::FileUpdated { source, target } => write!(
                f,
                "File: {} and file: {} differ, updating.",
                source.display(),
                target.display()
            ),
            SyncEvent::FileRemoved { path } => write!(
                f,
                "File {} does not exist in source. Removed.",
                path.display()
            ),
            SyncEvent::DirectoryRemoved { path } => write!(
                f,
                "Directory {} does not exist in source. Removed.",
                path.display()
            ),
            SyncEvent::SourceMissing { path } => write!(
                f,
                "Trying to sync folder '{}', but folder does not exist.",
                path.display()
            ),
            SyncEvent::TypeMismatch { source, target } => write!(
                f,
                "Directory {} is not a directory in source ({}). Skipped.",
                target.display(),
                source.display()
            ),
            SyncEvent::FileFailed { path, error } => {
                write!(f, "Failed to sync {}: {}", path.display(), error)
            }
            SyncEvent::CycleCompleted { elapsed, stats } => write!(
                f,
                "Sync took {:.4} seconds ({} created, {} updated, {} files removed, {} directories removed, {} failed).",
                elapsed.as_secs_f64(),
                stats.created,
                stats.updated,
                stats.removed_files,
                stats.removed_dirs,
                stats.failures
            ),
        }
    }
}

/// Receiver for sync events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SyncEvent);
}

/// Forwards events to the global tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: SyncEvent) {
        let kind = event.kind();
        match event.level() {
            EventLevel::Info => tracing::info!(event = kind, "{}", event),
            EventLevel::Warn => tracing::warn!(event = kind, "{}", event),
            EventLevel::Error => tracing::error!(event = kind, "{}", event),
        }
    }
}

/// Records events in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SyncEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().clone()
    }

    /// Drain recorded events
    pub fn take(&self) -> Vec<SyncEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn count_kind(&self, kind: &str) -> usize {
        self.events.lock().iter().filter(|e| e.kind() == kind).count()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: SyncEvent) {
        self.events.lock().push(event);
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: SyncEvent) {}
}
