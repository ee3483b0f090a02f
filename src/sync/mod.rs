//! Mutating side of mirroring
//!
//! The copier writes single files, the reconciler drives one full pass over
//! the source tree, the pruner deletes what source no longer has, and the
//! driver repeats passes on an interval until cancelled.

pub mod copier;
pub mod driver;
pub mod events;
pub mod pruner;
pub mod reconciler;

pub use driver::{CancellationToken, CycleDriver, DriverConfig, DriverSummary};
pub use events::{EventSink, MemorySink, NullSink, SyncEvent, TracingSink};
pub use pruner::Pruner;
pub use reconciler::{ReconcileOptions, Reconciler};

use crate::error::SyncError;
use crate::types::{FailurePolicy, SyncStats};
use std::path::Path;

/// Apply the failure policy to a per-path error
///
/// Under `Abort` the error is handed back for propagation. Under `Isolate` it
/// is reported, counted, and swallowed.
pub(crate) fn absorb_failure(
    policy: FailurePolicy,
    sink: &dyn EventSink,
    path: &Path,
    err: SyncError,
    stats: &mut SyncStats,
) -> Result<(), SyncError> {
    match policy {
        FailurePolicy::Abort => Err(err),
        FailurePolicy::Isolate => {
            stats.failures += 1;
            sink.emit(SyncEvent::FileFailed {
                path: path.to_path_buf(),
                error: err.to_string(),
            });
            Ok(())
        }
    }
}
