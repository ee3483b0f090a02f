//! Single-file transfer from source to target
//!
//! Content, permission bits and access/modification times are carried over.
//! No cleanup is attempted on failure: an interrupted copy can leave the
//! target truncated until the next cycle rewrites it.

use crate::error::SyncError;
use crate::sync::events::{EventSink, SyncEvent};
use crate::tree::hasher::CHUNK_SIZE;
use crate::types::{EntryKind, ReconcileDecision};
use std::fs::{self, File, FileTimes};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use tracing::debug;

/// Copy `source` over `target`, creating missing parent directories
///
/// Returns `Create` when the target did not exist beforehand and `Update`
/// otherwise. That check only selects the reported event; it does not gate
/// the copy. The event is emitted before any byte is written, so a failed
/// copy still leaves its "creating" or "updating" record in the log.
///
/// The target is inspected without following links. A symlink or special
/// file at `target` is removed first and replaced by a regular file, so
/// nothing outside the target tree is ever written through it.
pub fn copy_file(
    source: &Path,
    target: &Path,
    sink: &dyn EventSink,
) -> Result<ReconcileDecision, SyncError> {
    if let Some(parent) = target.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
            sink.emit(SyncEvent::DirectoryCreated {
                path: parent.to_path_buf(),
            });
        }
    }

    let existing = match fs::symlink_metadata(target) {
        Ok(metadata) => Some(EntryKind::from_file_type(metadata.file_type())),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(SyncError::io(target, e)),
    };

    let outcome = if existing.is_some() {
        sink.emit(SyncEvent::FileUpdated {
            source: source.to_path_buf(),
            target: target.to_path_buf(),
        });
        ReconcileDecision::Update
    } else {
        sink.emit(SyncEvent::FileCreated {
            source: source.to_path_buf(),
            target: target.to_path_buf(),
        });
        ReconcileDecision::Create
    };

    if matches!(existing, Some(EntryKind::Symlink | EntryKind::Other)) {
        fs::remove_file(target).map_err(|e| SyncError::io(target, e))?;
    }

    let bytes = stream_contents(source, target)?;
    debug!(source = %source.display(), target = %target.display(), bytes, "Copied file content");

    let metadata = fs::metadata(source).map_err(|e| SyncError::io(source, e))?;
    fs::set_permissions(target, metadata.permissions()).map_err(|e| SyncError::io(target, e))?;
    apply_times(target, &metadata)?;

    Ok(outcome)
}

/// Stream all bytes in `CHUNK_SIZE` pieces, truncating the target first
fn stream_contents(source: &Path, target: &Path) -> Result<u64, SyncError> {
    let mut reader = File::open(source).map_err(|e| SyncError::io(source, e))?;
    let mut writer = File::create(target).map_err(|e| SyncError::io(target, e))?;
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(SyncError::io(source, e)),
        };
        writer
            .write_all(&buf[..n])
            .map_err(|e| SyncError::io(target, e))?;
        total += n as u64;
    }
    writer.flush().map_err(|e| SyncError::io(target, e))?;

    Ok(total)
}

/// Set atime and mtime on `target` from the source metadata
fn apply_times(target: &Path, metadata: &fs::Metadata) -> Result<(), SyncError> {
    let mut times = FileTimes::new();
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    let modified = metadata.modified().map_err(|e| SyncError::io(target, e))?;
    times = times.set_modified(modified);

    // Windows needs a writable handle; a read-only mode just applied forces
    // the fallback on unix, where the owner may still set times.
    let file = File::options()
        .write(true)
        .open(target)
        .or_else(|_| File::open(target))
        .map_err(|e| SyncError::io(target, e))?;
    file.set_times(times).map_err(|e| SyncError::io(target, e))
}
