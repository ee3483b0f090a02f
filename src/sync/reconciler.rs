//! Reconciler: one full pass that brings the target tree in line with source

use crate::error::SyncError;
use crate::sync::copier;
use crate::sync::events::{EventSink, SyncEvent};
use crate::sync::pruner::Pruner;
use crate::sync::absorb_failure;
use crate::tree::compare;
use crate::tree::walker::Walker;
use crate::types::{EntryKind, FailurePolicy, ReconcileDecision, SyncCycleResult, SyncStats};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, instrument, trace};

/// Knobs for a reconcile pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Also compare SHA-256 digests, not only BLAKE3
    pub use_secondary: bool,
    pub failure_policy: FailurePolicy,
}

/// Walks source, copies what is new or different, then prunes target
pub struct Reconciler<'a> {
    options: ReconcileOptions,
    sink: &'a dyn EventSink,
}

impl<'a> Reconciler<'a> {
    pub fn new(options: ReconcileOptions, sink: &'a dyn EventSink) -> Self {
        Self { options, sink }
    }

    pub fn options(&self) -> ReconcileOptions {
        self.options
    }

    /// Run one reconcile cycle
    ///
    /// A missing source root yields `SourceMissing` without touching the
    /// target. A missing target root is created empty. Every regular file in
    /// source is classified and copied when needed, then the pruner runs
    /// unconditionally so deletions are picked up even when nothing was copied.
    #[instrument(skip_all, fields(source = %source_root.display(), target = %target_root.display()))]
    pub fn reconcile(
        &self,
        source_root: &Path,
        target_root: &Path,
    ) -> Result<SyncCycleResult, SyncError> {
        let start = Instant::now();

        if !source_root.exists() {
            self.sink.emit(SyncEvent::SourceMissing {
                path: source_root.to_path_buf(),
            });
            return Err(SyncError::SourceMissing(source_root.to_path_buf()));
        }
        if !source_root.is_dir() {
            return Err(SyncError::InvalidPath(format!(
                "Source {} is not a directory",
                source_root.display()
            )));
        }

        if !target_root.exists() {
            fs::create_dir_all(target_root).map_err(|e| SyncError::io(target_root, e))?;
            self.sink.emit(SyncEvent::TargetRootCreated {
                path: target_root.to_path_buf(),
            });
        } else if !target_root.is_dir() {
            return Err(SyncError::InvalidPath(format!(
                "Target {} is not a directory",
                target_root.display()
            )));
        }

        let mut stats = SyncStats::default();
        let walker = Walker::new(source_root);

        for entry in walker.entries() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(source_root).to_path_buf();
                    absorb_failure(self.options.failure_policy, self.sink, &path, e, &mut stats)?;
                    continue;
                }
            };

            match entry.kind {
                EntryKind::File => {}
                EntryKind::Directory => continue,
                EntryKind::Symlink | EntryKind::Other => {
                    trace!(path = %entry.relative.display(), kind = ?entry.kind, "Skipping non-regular entry");
                    continue;
                }
            }

            let source_path = source_root.join(&entry.relative);
            let target_path = target_root.join(&entry.relative);

            let outcome = self
                .unlink_ancestors(target_root, &entry.relative, &mut stats)
                .and_then(|()| self.sync_file(&source_path, &target_path));
            match outcome {
                Ok(decision) => stats.record(decision),
                Err(e) => absorb_failure(
                    self.options.failure_policy,
                    self.sink,
                    &source_path,
                    e,
                    &mut stats,
                )?,
            }
        }

        Pruner::new(self.options.failure_policy, self.sink).prune(
            source_root,
            target_root,
            &mut stats,
        )?;

        debug!(
            created = stats.created,
            updated = stats.updated,
            unchanged = stats.unchanged,
            removed_files = stats.removed_files,
            removed_dirs = stats.removed_dirs,
            failures = stats.failures,
            "Reconcile pass finished"
        );

        Ok(SyncCycleResult {
            elapsed: start.elapsed(),
            stats,
        })
    }

    /// Classify one source file against its target counterpart
    ///
    /// The target is looked at without following links: a symlink or special
    /// file there is always an Update, which replaces it with a regular file.
    pub fn decide(&self, source: &Path, target: &Path) -> Result<ReconcileDecision, SyncError> {
        let metadata = match fs::symlink_metadata(target) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ReconcileDecision::Create),
            Err(e) => return Err(SyncError::io(target, e)),
        };
        match EntryKind::from_file_type(metadata.file_type()) {
            EntryKind::Symlink | EntryKind::Other => return Ok(ReconcileDecision::Update),
            EntryKind::File | EntryKind::Directory => {}
        }
        if compare::are_identical(source, target, self.options.use_secondary)? {
            Ok(ReconcileDecision::Unchanged)
        } else {
            Ok(ReconcileDecision::Update)
        }
    }

    /// Remove a symlink sitting where a parent directory of `relative` belongs
    ///
    /// Parents are created on demand by the copier, which follows links, so a
    /// linked ancestor would redirect the copy outside the target tree.
    fn unlink_ancestors(
        &self,
        target_root: &Path,
        relative: &Path,
        stats: &mut SyncStats,
    ) -> Result<(), SyncError> {
        let Some(parent) = relative.parent() else {
            return Ok(());
        };
        let mut current = target_root.to_path_buf();
        for component in parent.components() {
            current.push(component);
            match fs::symlink_metadata(&current) {
                Ok(metadata) if metadata.file_type().is_symlink() => {
                    fs::remove_file(&current).map_err(|e| SyncError::io(&current, e))?;
                    stats.removed_files += 1;
                    self.sink.emit(SyncEvent::FileRemoved { path: current });
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
                Err(e) => return Err(SyncError::io(&current, e)),
            }
        }
        Ok(())
    }

    /// Decide and, for Create or Update, copy. Unchanged files are not reported.
    fn sync_file(&self, source: &Path, target: &Path) -> Result<ReconcileDecision, SyncError> {
        let decision = self.decide(source, target)?;
        if decision.needs_copy() {
            return copier::copy_file(source, target, self.sink);
        }
        Ok(decision)
    }
}
