//! Configuration System
//!
//! Layered configuration for a mirroring run. Lowest to highest precedence:
//! built-in defaults, the global config file, an explicit `--config` file,
//! `TREESYNC_*` environment variables, then command-line flags (applied by
//! the binary on top of the loaded value).

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::sync::{DriverConfig, ReconcileOptions};
use crate::tree::path::{is_within, resolve_path};
use crate::types::FailurePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod merge;
mod sources;

pub use merge::merge_policy::ENV_PREFIX;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Tree to mirror from
    #[serde(default)]
    pub source: Option<PathBuf>,

    /// Tree to mirror onto
    #[serde(default)]
    pub target: Option<PathBuf>,

    /// Seconds between the end of one cycle and the start of the next.
    /// Unset means a single cycle.
    #[serde(default)]
    pub interval_secs: Option<u64>,

    /// Compare SHA-256 digests in addition to BLAKE3
    #[serde(default)]
    pub secondary_digest: bool,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Stop after this many cycles
    #[serde(default)]
    pub max_cycles: Option<u64>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SyncConfig {
    /// Check the configuration and produce the driver's view of it
    ///
    /// Both roots must be set and distinct, and neither may contain the
    /// other: a target nested in its own source would be copied into itself
    /// on every cycle.
    pub fn driver_config(&self) -> Result<DriverConfig, ApiError> {
        let source = self
            .source
            .clone()
            .ok_or_else(|| ApiError::ConfigError("Source folder is required".to_string()))?;
        let target = self
            .target
            .clone()
            .ok_or_else(|| ApiError::ConfigError("Target folder is required".to_string()))?;

        check_roots(&source, &target)?;

        if self.max_cycles == Some(0) {
            return Err(ApiError::ConfigError(
                "max_cycles must be at least 1".to_string(),
            ));
        }

        Ok(DriverConfig {
            source,
            target,
            interval: self.interval_secs.map(Duration::from_secs),
            max_cycles: self.max_cycles,
            options: ReconcileOptions {
                use_secondary: self.secondary_digest,
                failure_policy: self.failure_policy,
            },
        })
    }
}

fn check_roots(source: &Path, target: &Path) -> Result<(), ApiError> {
    let source_abs = resolve_path(source).map_err(|e| ApiError::ConfigError(e.to_string()))?;
    let target_abs = resolve_path(target).map_err(|e| ApiError::ConfigError(e.to_string()))?;

    if source_abs == target_abs {
        return Err(ApiError::ConfigError(format!(
            "Source and target are the same folder: {}",
            source_abs.display()
        )));
    }
    if is_within(&target_abs, &source_abs) {
        return Err(ApiError::ConfigError(format!(
            "Target {} is inside source {}",
            target_abs.display(),
            source_abs.display()
        )));
    }
    if is_within(&source_abs, &target_abs) {
        return Err(ApiError::ConfigError(format!(
            "Source {} is inside target {}",
            source_abs.display(),
            target_abs.display()
        )));
    }
    Ok(())
}

/// Builds a [`SyncConfig`] from the layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, the global file, an optional explicit file and environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<SyncConfig, ApiError> {
        let mut builder = merge::merge_policy::builder_with_defaults()?;
        builder = sources::global_file::add_to_builder(builder)?;
        if let Some(path) = explicit {
            builder = sources::explicit_file::add_to_builder(builder, path)?;
        }
        builder = builder.add_source(merge::merge_policy::environment());

        let config: SyncConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Load defaults plus a single file, ignoring global file and environment
    pub fn load_from_file(path: &Path) -> Result<SyncConfig, ApiError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::explicit_file::add_to_builder(builder, path)?;
        let config: SyncConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }
}
