//! Error types for the tree mirroring engine.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reconciling a target tree against a source tree
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Source folder does not exist: {0}")]
    SourceMissing(PathBuf),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk directory: {0}")]
    Walk(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl SyncError {
    /// Attach the offending path to an I/O error
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Path the error refers to, when known
    pub fn path(&self) -> Option<&Path> {
        match self {
            SyncError::SourceMissing(path) | SyncError::Io { path, .. } => Some(path),
            SyncError::Walk(_) | SyncError::InvalidPath(_) => None,
        }
    }

    /// Whether the driver may skip this cycle and keep looping
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SyncError::SourceMissing(_))
    }
}

impl From<walkdir::Error> for SyncError {
    fn from(err: walkdir::Error) -> Self {
        match (err.path().map(Path::to_path_buf), err.io_error()) {
            (Some(path), Some(io)) => SyncError::Io {
                path,
                source: std::io::Error::new(io.kind(), io.to_string()),
            },
            _ => SyncError::Walk(err.to_string()),
        }
    }
}

/// Errors from the outer surface: configuration, logging, process setup
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),

    #[error("Sync error: {0}")]
    SyncError(#[from] SyncError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
