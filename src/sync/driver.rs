//! Cycle driver: repeats reconcile passes on a fixed interval
//!
//! Cancellation is cooperative. The token is checked before each cycle and
//! the inter-cycle sleep wakes as soon as the token is cancelled, but a cycle
//! that has started always runs to completion or failure.

use crate::error::SyncError;
use crate::sync::events::{EventSink, SyncEvent};
use crate::sync::reconciler::{ReconcileOptions, Reconciler};
use crate::types::SyncStats;
use parking_lot::{Condvar, Mutex};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
struct TokenState {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Shared cancellation flag with an interruptible wait
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark cancelled and wake every waiter
    pub fn cancel(&self) {
        let mut cancelled = self.state.cancelled.lock();
        *cancelled = true;
        self.state.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.cancelled.lock()
    }

    /// Sleep up to `timeout`. Returns true if the token was cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut cancelled = self.state.cancelled.lock();
        while !*cancelled {
            if self.state.wake.wait_until(&mut cancelled, deadline).timed_out() {
                break;
            }
        }
        *cancelled
    }
}

/// What the driver runs and how often
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub source: PathBuf,
    pub target: PathBuf,
    /// Delay between the end of one cycle and the start of the next.
    /// `None` runs a single cycle.
    pub interval: Option<Duration>,
    /// Stop after this many cycles, skipped ones included
    pub max_cycles: Option<u64>,
    pub options: ReconcileOptions,
}

/// Totals across all cycles run by the driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverSummary {
    pub cycles: u64,
    /// Cycles skipped because the source was missing
    pub skipped: u64,
    pub totals: SyncStats,
    pub cancelled: bool,
}

impl DriverSummary {
    fn absorb(&mut self, stats: &SyncStats) {
        self.totals.created += stats.created;
        self.totals.updated += stats.updated;
        self.totals.unchanged += stats.unchanged;
        self.totals.removed_files += stats.removed_files;
        self.totals.removed_dirs += stats.removed_dirs;
        self.totals.failures += stats.failures;
    }
}

pub struct CycleDriver<'a> {
    config: DriverConfig,
    sink: &'a dyn EventSink,
}

impl<'a> CycleDriver<'a> {
    pub fn new(config: DriverConfig, sink: &'a dyn EventSink) -> Self {
        Self { config, sink }
    }

    /// Run cycles until cancelled, the cycle limit is hit, or a fatal error
    ///
    /// A missing source skips the cycle and the loop continues. Any other
    /// error ends the loop and is returned.
    pub fn run(&self, token: &CancellationToken) -> Result<DriverSummary, SyncError> {
        let reconciler = Reconciler::new(self.config.options, self.sink);
        let mut summary = DriverSummary::default();

        info!(
            source = %self.config.source.display(),
            target = %self.config.target.display(),
            interval = ?self.config.interval,
            "Starting sync loop"
        );

        loop {
            if token.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let start = Instant::now();
            let stats = match reconciler.reconcile(&self.config.source, &self.config.target) {
                Ok(result) => result.stats,
                Err(e) if e.is_recoverable() => {
                    debug!("Cycle skipped: {}", e);
                    summary.skipped += 1;
                    SyncStats::default()
                }
                Err(e) => {
                    error!("Sync cycle failed: {}", e);
                    return Err(e);
                }
            };
            let elapsed = start.elapsed();

            summary.cycles += 1;
            summary.absorb(&stats);
            if stats.failures > 0 {
                warn!(failures = stats.failures, "Cycle completed with isolated failures");
            }
            self.sink.emit(SyncEvent::CycleCompleted { elapsed, stats });

            if let Some(max) = self.config.max_cycles {
                if summary.cycles >= max {
                    break;
                }
            }

            let Some(interval) = self.config.interval else {
                break;
            };
            if token.wait_timeout(interval) {
                summary.cancelled = true;
                break;
            }
        }

        info!(
            cycles = summary.cycles,
            skipped = summary.skipped,
            cancelled = summary.cancelled,
            "Sync loop stopped"
        );
        Ok(summary)
    }
}
