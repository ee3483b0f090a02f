//! Pruner: removes target paths that have no counterpart in source
//!
//! The only mutation performed here is removal. Directories are processed
//! from an explicit stack of frames, each frame holding the sorted entries of
//! one target directory and a cursor into them, so tree depth never grows the
//! call stack. A frame for a directory missing from source removes the
//! directory itself once all of its entries have been handled.

use crate::error::SyncError;
use crate::sync::absorb_failure;
use crate::sync::events::{EventSink, SyncEvent};
use crate::types::{EntryKind, FailurePolicy, SyncStats};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::trace;

/// One pending target directory
struct PruneFrame {
    source_dir: PathBuf,
    target_dir: PathBuf,
    entries: Vec<(OsString, EntryKind)>,
    next: usize,
    /// Set when `source_dir` does not exist
    remove_when_done: bool,
}

impl PruneFrame {
    fn open(
        source_dir: PathBuf,
        target_dir: PathBuf,
        remove_when_done: bool,
    ) -> Result<Self, SyncError> {
        let mut entries = Vec::new();
        let read_dir = fs::read_dir(&target_dir).map_err(|e| SyncError::io(&target_dir, e))?;
        for entry in read_dir {
            let entry = entry.map_err(|e| SyncError::io(&target_dir, e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| SyncError::io(&entry.path(), e))?;
            entries.push((entry.file_name(), EntryKind::from_file_type(file_type)));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(Self {
            source_dir,
            target_dir,
            entries,
            next: 0,
            remove_when_done,
        })
    }
}

/// Whether a source lookup found something. Only `NotFound` counts as
/// absent; any other failure is handed back.
fn source_presence(lookup: std::io::Result<fs::Metadata>) -> std::io::Result<bool> {
    match lookup {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

pub struct Pruner<'a> {
    failure_policy: FailurePolicy,
    sink: &'a dyn EventSink,
}

impl<'a> Pruner<'a> {
    pub fn new(failure_policy: FailurePolicy, sink: &'a dyn EventSink) -> Self {
        Self {
            failure_policy,
            sink,
        }
    }

    /// Remove everything under `target_root` that has no counterpart under `source_root`
    ///
    /// Files and symlinks missing from source are deleted directly. Directories
    /// missing from source are emptied and then removed. Directories present
    /// on both sides are descended into. A target directory facing a
    /// non-directory in source is left alone and reported as a type mismatch.
    pub fn prune(
        &self,
        source_root: &Path,
        target_root: &Path,
        stats: &mut SyncStats,
    ) -> Result<(), SyncError> {
        let root = PruneFrame::open(source_root.to_path_buf(), target_root.to_path_buf(), false)?;
        let mut stack = vec![root];

        while let Some(frame) = stack.last_mut() {
            if frame.next >= frame.entries.len() {
                let Some(done) = stack.pop() else { break };
                if done.remove_when_done {
                    match fs::remove_dir(&done.target_dir) {
                        Ok(()) => {
                            stats.removed_dirs += 1;
                            self.sink.emit(SyncEvent::DirectoryRemoved {
                                path: done.target_dir,
                            });
                        }
                        Err(e) => {
                            let err = SyncError::io(&done.target_dir, e);
                            self.absorb(&done.target_dir, err, stats)?;
                        }
                    }
                }
                continue;
            }

            let (name, kind) = frame.entries[frame.next].clone();
            frame.next += 1;

            let source_path = frame.source_dir.join(&name);
            let target_path = frame.target_dir.join(&name);
            let source_exists = if frame.remove_when_done {
                false
            } else {
                match source_presence(fs::symlink_metadata(&source_path)) {
                    Ok(present) => present,
                    Err(e) => {
                        // Unknown is not absent: keep the target entry
                        let err = SyncError::io(&source_path, e);
                        self.absorb(&target_path, err, stats)?;
                        continue;
                    }
                }
            };

            if !source_exists {
                match kind {
                    EntryKind::Directory => {
                        match PruneFrame::open(source_path, target_path.clone(), true) {
                            Ok(child) => stack.push(child),
                            Err(e) => self.absorb(&target_path, e, stats)?,
                        }
                    }
                    EntryKind::File | EntryKind::Symlink | EntryKind::Other => {
                        match fs::remove_file(&target_path) {
                            Ok(()) => {
                                stats.removed_files += 1;
                                self.sink.emit(SyncEvent::FileRemoved { path: target_path });
                            }
                            Err(e) => {
                                let err = SyncError::io(&target_path, e);
                                self.absorb(&target_path, err, stats)?;
                            }
                        }
                    }
                }
                continue;
            }

            if kind == EntryKind::Directory {
                if source_path.is_dir() {
                    match PruneFrame::open(source_path, target_path.clone(), false) {
                        Ok(child) => stack.push(child),
                        Err(e) => self.absorb(&target_path, e, stats)?,
                    }
                } else {
                    self.sink.emit(SyncEvent::TypeMismatch {
                        source: source_path,
                        target: target_path,
                    });
                }
            } else {
                trace!(path = %target_path.display(), "Present in source, kept");
            }
        }

        Ok(())
    }

    fn absorb(&self, path: &Path, err: SyncError, stats: &mut SyncStats) -> Result<(), SyncError> {
        absorb_failure(self.failure_policy, self.sink, path, err, stats)
    }
}
