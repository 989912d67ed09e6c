//! Application telemetry events and sinks.
//!
//! Telemetry stays on the local machine: it captures operational signals
//! such as batch totals to support debugging long runs.

use std::io;

use serde::{Deserialize, Serialize};

use crate::batch::BatchSummary;
use crate::export::ExportedSummary;

/// A structured telemetry event emitted by prsweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// Records the totals of a finished batch run.
    BatchCompleted {
        /// Operation name (e.g. `resolve-thread`).
        operation: String,
        /// Number of submitted targets.
        total: usize,
        /// Successful targets, no-ops included.
        succeeded: usize,
        /// Failed targets.
        failed: usize,
        /// Targets not attempted.
        skipped: usize,
        /// Run duration in milliseconds.
        elapsed_ms: u64,
        /// Whether the run stopped early.
        cancelled: bool,
    },
}

impl TelemetryEvent {
    /// Builds a [`TelemetryEvent::BatchCompleted`] from a finished run.
    #[must_use]
    pub fn batch_completed(summary: &BatchSummary) -> Self {
        let exported = ExportedSummary::from(summary);
        Self::BatchCompleted {
            operation: exported.operation.as_str().to_owned(),
            total: exported.total,
            succeeded: exported.succeeded,
            failed: exported.failed,
            skipped: exported.skipped,
            elapsed_ms: exported.elapsed_ms,
            cancelled: exported.cancelled,
        }
    }
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Records telemetry events to stderr as JSON lines (JSONL).
///
/// This is intended for local debugging and is not transmitted anywhere.
#[derive(Debug, Default)]
pub struct StderrJsonlTelemetrySink;

impl TelemetrySink for StderrJsonlTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        let Ok(serialised) = serde_json::to_string(&event) else {
            return;
        };

        let _ignored = writeln_stderr(&serialised);
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}

/// Test doubles for telemetry.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use std::sync::{Mutex, PoisonError};

    use super::{TelemetryEvent, TelemetrySink};

    /// Sink that keeps every recorded event in memory.
    #[derive(Debug, Default)]
    pub struct RecordingTelemetrySink {
        events: Mutex<Vec<TelemetryEvent>>,
    }

    impl RecordingTelemetrySink {
        /// Removes and returns the recorded events.
        #[must_use]
        pub fn take(&self) -> Vec<TelemetryEvent> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .drain(..)
                .collect()
        }
    }

    impl TelemetrySink for RecordingTelemetrySink {
        fn record(&self, event: TelemetryEvent) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        }
    }
}
