//! Content comparison of two files by fingerprint
//!
//! Identity is decided by content alone. Size and modification time are not
//! consulted, so a file rewritten to the same size or touched by a skewed
//! clock still compares correctly. The price is a full read of both files on
//! every call.

use crate::error::SyncError;
use crate::tree::hasher;
use std::path::Path;
use tracing::trace;

/// Return true iff both files have equal fingerprints
///
/// Errors from either side are propagated unchanged.
pub fn are_identical(a: &Path, b: &Path, use_secondary: bool) -> Result<bool, SyncError> {
    let fp_a = hasher::fingerprint(a, use_secondary)?;
    let fp_b = hasher::fingerprint(b, use_secondary)?;
    if fp_a == fp_b {
        return Ok(true);
    }
    trace!(
        a = %a.display(),
        b = %b.display(),
        a_blake3 = %fp_a.primary_hex(),
        b_blake3 = %fp_b.primary_hex(),
        a_sha256 = ?fp_a.secondary_hex(),
        b_sha256 = ?fp_b.secondary_hex(),
        "Fingerprints differ"
    );
    Ok(false)
}
