//! CLI parse: clap types for treesync and how flags override loaded configuration.

use crate::config::{ConfigLoader, SyncConfig};
use crate::error::ApiError;
use crate::types::FailurePolicy;
use clap::Parser;
use std::path::PathBuf;

/// Treesync - one-way periodic mirroring of a directory tree
#[derive(Debug, Parser)]
#[command(name = "treesync", version)]
#[command(about = "Mirror a source folder onto a target folder at a fixed interval")]
pub struct Cli {
    /// Source folder to sync
    pub source_folder: Option<PathBuf>,

    /// Target folder to sync
    pub target_folder: Option<PathBuf>,

    /// Path to log file (events are also echoed to stdout)
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Time in seconds between folder synchronization; omit to sync once
    #[arg(long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Also compare SHA-256 digests (`--sha`, `--sha true`, `--sha false`)
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub sha: Option<bool>,

    /// Run a single cycle and exit, even if an interval is configured
    #[arg(long)]
    pub once: bool,

    /// Stop after this many cycles
    #[arg(long, value_name = "N")]
    pub max_cycles: Option<u64>,

    /// Per-file failure handling: abort (default) or isolate
    #[arg(long, value_name = "POLICY")]
    pub on_error: Option<FailurePolicy>,

    /// Configuration file path (layered over the global config file)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Suppress console output; a log file given with --log is still written
    #[arg(long)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    /// Load layered configuration and apply command-line overrides on top
    pub fn resolve_config(&self) -> Result<SyncConfig, ApiError> {
        let mut config = ConfigLoader::load(self.config.as_deref())?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    /// Flags override whatever the config layers produced
    pub fn apply_overrides(&self, config: &mut SyncConfig) {
        if let Some(ref source) = self.source_folder {
            config.source = Some(source.clone());
        }
        if let Some(ref target) = self.target_folder {
            config.target = Some(target.clone());
        }
        if let Some(interval) = self.interval {
            config.interval_secs = Some(interval);
        }
        if self.once {
            config.interval_secs = None;
            config.max_cycles = Some(1);
        }
        if let Some(max) = self.max_cycles {
            config.max_cycles = Some(max);
        }
        if let Some(sha) = self.sha {
            config.secondary_digest = sha;
        }
        if let Some(policy) = self.on_error {
            config.failure_policy = policy;
        }

        let logging = &mut config.logging;
        if let Some(ref path) = self.log {
            logging.file = Some(path.clone());
            logging.output = "file+stdout".to_string();
        }
        if self.verbose {
            logging.level = "debug".to_string();
        }
        if let Some(ref level) = self.log_level {
            logging.level = level.clone();
        }
        if let Some(ref format) = self.log_format {
            logging.format = format.clone();
        }
        if self.quiet {
            if logging.output.starts_with("file") {
                logging.output = "file".to_string();
            } else {
                logging.enabled = false;
            }
        }
    }
}
