//! Root path resolution and containment checks

use crate::error::SyncError;
use std::path::{Component, Path, PathBuf};

/// Resolve a path to an absolute form for comparison
///
/// Existing paths are canonicalized (symlinks resolved). For paths that do not
/// exist yet, the longest existing ancestor is canonicalized and the remaining
/// components are appended lexically.
pub fn resolve_path(path: &Path) -> Result<PathBuf, SyncError> {
    if let Ok(canonical) = dunce::canonicalize(path) {
        return Ok(canonical);
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| SyncError::io(path, e))?
            .join(path)
    };

    let mut existing = absolute.as_path();
    let mut tail = Vec::new();
    loop {
        if let Ok(canonical) = dunce::canonicalize(existing) {
            let mut resolved = canonical;
            for component in tail.iter().rev() {
                resolved.push(component);
            }
            return Ok(normalize_lexically(&resolved));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(normalize_lexically(&absolute)),
        }
    }
}

/// Drop `.` components and fold `..` into the preceding component
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True if `inner` equals `outer` or lies below it
pub fn is_within(inner: &Path, outer: &Path) -> bool {
    inner.starts_with(outer)
}
