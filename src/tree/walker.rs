//! Filesystem walker for traversing the source tree

use crate::error::SyncError;
use crate::types::{EntryKind, TreeEntry};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Filesystem walker
///
/// Symbolic links are reported as `EntryKind::Symlink` and never followed.
/// The traversal is iterative, so deep trees do not grow the call stack.
pub struct Walker {
    root: PathBuf,
}

impl Walker {
    /// Create a new walker for the given root path
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily iterate the entries below the root, depth-first
    ///
    /// Siblings are visited in file-name order. The root itself is skipped.
    pub fn entries(&self) -> impl Iterator<Item = Result<TreeEntry, SyncError>> + '_ {
        WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .map(move |entry| {
                let entry = entry?;
                let relative = entry
                    .path()
                    .strip_prefix(&self.root)
                    .map_err(|_| {
                        SyncError::InvalidPath(format!(
                            "{} is not under {}",
                            entry.path().display(),
                            self.root.display()
                        ))
                    })?
                    .to_path_buf();
                Ok(TreeEntry {
                    relative,
                    kind: EntryKind::from_file_type(entry.file_type()),
                })
            })
    }

    /// Walk the filesystem and collect all entries
    ///
    /// Returns entries sorted by relative path.
    pub fn walk(&self) -> Result<Vec<TreeEntry>, SyncError> {
        let mut entries = self.entries().collect::<Result<Vec<_>, _>>()?;
        entries.sort_by(|a, b| a.relative.cmp(&b.relative));
        Ok(entries)
    }
}
