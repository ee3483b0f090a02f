//! Logging System
//!
//! Structured logging implementation using the `tracing` crate. One record per
//! sync event: timestamp, level, message. Output can go to the console, a log
//! file, or both.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// Environment variable holding an EnvFilter directive that overrides `level`
pub const LOG_ENV_VAR: &str = "TREESYNC_LOG";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Master switch; when false no subscriber is installed
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file, file+stdout, file+stderr
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path (required if output includes "file")
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Append to an existing log file instead of truncating it
    #[serde(default)]
    pub append: bool,

    /// Enable colored output (text format only, stdout/stderr only)
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stdout".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            append: false,
            color: true,
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Initialize the global logging subscriber
///
/// `TREESYNC_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ApiError> {
    if !config.enabled {
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let json = determine_format(config)? == "json";
    let output = parse_output_destinations(&config.output)?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if output.file {
        let file = open_log_file(config)?;
        layers.push(make_layer(json, false, Mutex::new(file)));
    }
    if output.stdout {
        layers.push(make_layer(json, config.color, std::io::stdout));
    }
    if output.stderr {
        layers.push(make_layer(json, config.color, std::io::stderr));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| ApiError::LoggingError(format!("Failed to install subscriber: {}", e)))
}

fn make_layer<W>(json: bool, ansi: bool, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_target(false)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(writer);
    if json {
        layer.json().boxed()
    } else {
        layer.with_ansi(ansi).boxed()
    }
}

fn open_log_file(config: &LoggingConfig) -> Result<std::fs::File, ApiError> {
    let path = config.file.as_ref().ok_or_else(|| {
        ApiError::LoggingError("Log output includes a file but no log file path is set".to_string())
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ApiError::LoggingError(format!("Failed to create log directory: {}", e))
            })?;
        }
    }

    let mut options = std::fs::OpenOptions::new();
    options.create(true);
    if config.append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options.open(path).map_err(|e| {
        ApiError::LoggingError(format!("Failed to open log file {:?}: {}", path, e))
    })
}

/// Build environment filter from config or environment variables
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ApiError> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV_VAR) {
        return Ok(filter);
    }

    EnvFilter::try_new(&config.level)
        .map_err(|e| ApiError::LoggingError(format!("Invalid log level {}: {}", config.level, e)))
}

fn determine_format(config: &LoggingConfig) -> Result<&str, ApiError> {
    match config.format.as_str() {
        "json" | "text" => Ok(config.format.as_str()),
        other => Err(ApiError::LoggingError(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            other
        ))),
    }
}

/// Output destinations
#[derive(Debug, PartialEq, Eq)]
struct OutputDestinations {
    stdout: bool,
    stderr: bool,
    file: bool,
}

fn parse_output_destinations(output: &str) -> Result<OutputDestinations, ApiError> {
    let (stdout, stderr, file) = match output {
        "stdout" => (true, false, false),
        "stderr" => (false, true, false),
        "file" => (false, false, true),
        "file+stdout" => (true, false, true),
        "file+stderr" => (false, true, true),
        _ => {
            return Err(ApiError::LoggingError(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr', 'file', 'file+stdout' or 'file+stderr')",
                output
            )))
        }
    };
    Ok(OutputDestinations {
        stdout,
        stderr,
        file,
    })
}
