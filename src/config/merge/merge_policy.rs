//! Merge rules: defaults, override order, environment overlay.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Prefix for environment overrides, e.g. `TREESYNC_INTERVAL_SECS=30`
pub const ENV_PREFIX: &str = "TREESYNC";

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("secondary_digest", false)?
        .set_default("failure_policy", "abort")?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stdout")
}

/// Environment source layered last among file sources.
///
/// Nested keys use a double underscore: `TREESYNC_LOGGING__LEVEL=debug`.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
