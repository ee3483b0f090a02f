//! Content fingerprints for files using BLAKE3, optionally paired with SHA-256

use crate::error::SyncError;
use crate::types::Digest;
use blake3::Hasher;
use sha2::{Digest as _, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Read size for streaming file content into the digests
pub const CHUNK_SIZE: usize = 4096;

/// Content fingerprint of a single file
///
/// Two fingerprints are equal iff the primary digests match and the
/// secondary digests are either absent on both sides or present and equal.
/// The derived `PartialEq` gives exactly that rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileFingerprint {
    /// BLAKE3 over the full byte stream
    pub primary: Digest,
    /// SHA-256 over the same stream, when requested
    pub secondary: Option<Digest>,
}

impl FileFingerprint {
    pub fn primary_hex(&self) -> String {
        hex::encode(self.primary)
    }

    pub fn secondary_hex(&self) -> Option<String> {
        self.secondary.map(hex::encode)
    }
}

/// Compute the fingerprint of the file at `path`
///
/// The file is read from start to end in `CHUNK_SIZE` pieces. Each chunk is
/// fed to the BLAKE3 state and, when `use_secondary` is set, to a SHA-256
/// state in the same pass. Nothing is cached: every call re-reads the file.
pub fn fingerprint(path: &Path, use_secondary: bool) -> Result<FileFingerprint, SyncError> {
    let file = File::open(path).map_err(|e| SyncError::io(path, e))?;
    fingerprint_reader(file, use_secondary).map_err(|e| SyncError::io(path, e))
}

/// Fingerprint an arbitrary byte stream
pub fn fingerprint_reader<R: Read>(
    mut reader: R,
    use_secondary: bool,
) -> std::io::Result<FileFingerprint> {
    let mut primary = Hasher::new();
    let mut secondary = use_secondary.then(Sha256::new);
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        primary.update(&buf[..n]);
        if let Some(sha) = secondary.as_mut() {
            sha.update(&buf[..n]);
        }
    }

    Ok(FileFingerprint {
        primary: *primary.finalize().as_bytes(),
        secondary: secondary.map(|sha| sha.finalize().into()),
    })
}

/// Compute the primary digest of in-memory bytes
pub fn compute_content_hash(content: &[u8]) -> Digest {
    let mut hasher = Hasher::new();
    hasher.update(content);
    *hasher.finalize().as_bytes()
}
