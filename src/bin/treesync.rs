//! Treesync CLI Binary
//!
//! Command-line entry point: resolves configuration, sets up logging, runs
//! the cycle driver and turns an interrupt into a clean exit.

use clap::Parser;
use std::process;
use treesync::cli::Cli;
use treesync::config::SyncConfig;
use treesync::error::ApiError;
use treesync::logging::init_logging;
use treesync::sync::{CancellationToken, CycleDriver, DriverConfig, DriverSummary, TracingSink};
use tracing::{error, info, warn};

fn main() {
    let cli = Cli::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    log_arguments(&config);

    let driver_config = match config.driver_config() {
        Ok(driver_config) => driver_config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    match run(driver_config) {
        Ok(summary) => {
            if summary.cancelled {
                println!("Operation cancelled.");
            }
            info!(cycles = summary.cycles, "Treesync finished");
        }
        Err(e) => {
            error!("Treesync stopped: {}", e);
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn log_arguments(config: &SyncConfig) {
    info!(
        "Arguments: {}, {}, --log {}, --interval {}, --sha {}",
        display_opt(config.source.as_ref().map(|p| p.display().to_string())),
        display_opt(config.target.as_ref().map(|p| p.display().to_string())),
        display_opt(config.logging.file.as_ref().map(|p| p.display().to_string())),
        display_opt(config.interval_secs.map(|s| s.to_string())),
        config.secondary_digest
    );
}

fn display_opt(value: Option<String>) -> String {
    value.unwrap_or_else(|| "None".to_string())
}

/// Run the blocking cycle loop while a signal task waits for Ctrl-C
///
/// The first interrupt cancels the token, so the loop stops once the current
/// cycle is done. A second interrupt exits immediately.
fn run(config: DriverConfig) -> Result<DriverSummary, ApiError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ApiError::RuntimeError(format!("Failed to start runtime: {}", e)))?;

    let token = CancellationToken::new();

    runtime.block_on(async move {
        let signal_token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                warn!("Interrupt handler unavailable; stop with a kill signal");
                return;
            }
            info!("Interrupt received, stopping after the current cycle");
            signal_token.cancel();

            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Operation cancelled.");
                process::exit(130);
            }
        });

        let worker = tokio::task::spawn_blocking(move || {
            let sink = TracingSink;
            CycleDriver::new(config, &sink).run(&token)
        });

        let summary = worker
            .await
            .map_err(|e| ApiError::RuntimeError(format!("Sync worker failed: {}", e)))??;
        Ok::<DriverSummary, ApiError>(summary)
    })
}
