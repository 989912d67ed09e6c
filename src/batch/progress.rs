//! Progress reporting for batch runs.
//!
//! Reporters are purely observational. The executor never calls one
//! directly: events are pushed through a bounded channel with `try_send` and
//! delivered by a forwarder task, so a slow reporter loses events instead of
//! stalling remote calls.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::aggregator::{BatchSummary, TargetReport};
use super::outcome::OperationOutcome;

/// Capacity of the progress channel between workers and the forwarder.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 256;

/// Longest time the executor waits for the final progress event to drain.
pub const PROGRESS_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Sink for incremental run status.
///
/// Callbacks run on the forwarder task and should return quickly.
pub trait ProgressReporter: Send + Sync {
    /// Called once before any target runs.
    fn on_start(&self, total: usize);

    /// Called after each target records its outcome.
    fn on_item_done(&self, report: &TargetReport, completed: usize, total: usize);

    /// Called once with the final summary.
    fn on_finish(&self, summary: &BatchSummary);
}

/// Reporter that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn on_start(&self, _total: usize) {}

    fn on_item_done(&self, _report: &TargetReport, _completed: usize, _total: usize) {}

    fn on_finish(&self, _summary: &BatchSummary) {}
}

/// Reporter emitting structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn on_start(&self, total: usize) {
        info!(total, "batch started");
    }

    fn on_item_done(&self, report: &TargetReport, completed: usize, total: usize) {
        match &report.outcome {
            OperationOutcome::Failed { kind, message, .. } => warn!(
                target_index = report.index,
                item = %report.target,
                kind = kind.as_str(),
                completed,
                total,
                "target failed: {message}"
            ),
            outcome => debug!(
                target_index = report.index,
                item = %report.target,
                outcome = %outcome,
                duration_ms = u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
                completed,
                total,
                "target done"
            ),
        }
    }

    fn on_finish(&self, summary: &BatchSummary) {
        info!(
            operation = %summary.operation,
            total = summary.total,
            succeeded = summary.counts.succeeded,
            failed = summary.counts.failed,
            skipped = summary.counts.skipped,
            cancelled = summary.cancelled,
            "batch finished"
        );
    }
}

/// Reporter writing one short line per event to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrLineProgress;

impl StderrLineProgress {
    fn emit(line: &str) {
        // Progress output is best effort.
        drop(writeln!(io::stderr().lock(), "{line}"));
    }
}

impl ProgressReporter for StderrLineProgress {
    fn on_start(&self, total: usize) {
        Self::emit(&format!("starting {total} target(s)"));
    }

    fn on_item_done(&self, report: &TargetReport, completed: usize, total: usize) {
        Self::emit(&format!(
            "[{completed}/{total}] {}: {}",
            report.target, report.outcome
        ));
    }

    fn on_finish(&self, summary: &BatchSummary) {
        Self::emit(&format!(
            "done: {} succeeded, {} failed, {} skipped",
            summary.counts.succeeded, summary.counts.failed, summary.counts.skipped
        ));
    }
}

enum ProgressEvent {
    Started { total: usize },
    ItemDone {
        report: TargetReport,
        completed: usize,
        total: usize,
    },
    Finished(Box<BatchSummary>),
}

fn dispatch(reporter: &dyn ProgressReporter, event: ProgressEvent) {
    match event {
        ProgressEvent::Started { total } => reporter.on_start(total),
        ProgressEvent::ItemDone {
            report,
            completed,
            total,
        } => reporter.on_item_done(&report, completed, total),
        ProgressEvent::Finished(summary) => reporter.on_finish(&summary),
    }
}

/// Non-blocking handle workers use to publish progress.
#[derive(Clone)]
pub(crate) struct ProgressSender {
    tx: mpsc::Sender<ProgressEvent>,
    dropped: Arc<AtomicUsize>,
}

impl ProgressSender {
    fn offer(&self, event: ProgressEvent) {
        if self.tx.try_send(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn started(&self, total: usize) {
        self.offer(ProgressEvent::Started { total });
    }

    pub(crate) fn item_done(&self, report: TargetReport, completed: usize, total: usize) {
        self.offer(ProgressEvent::ItemDone {
            report,
            completed,
            total,
        });
    }
}

/// Owns the forwarder task delivering events to a [`ProgressReporter`].
pub(crate) struct ProgressForwarder {
    sender: ProgressSender,
    handle: JoinHandle<()>,
}

impl ProgressForwarder {
    /// Spawns the forwarder task.
    pub(crate) fn spawn(reporter: Arc<dyn ProgressReporter>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                dispatch(reporter.as_ref(), event);
            }
        });
        Self {
            sender: ProgressSender {
                tx,
                dropped: Arc::new(AtomicUsize::new(0)),
            },
            handle,
        }
    }

    pub(crate) fn sender(&self) -> ProgressSender {
        self.sender.clone()
    }

    /// Delivers `summary` and waits for the forwarder to drain.
    ///
    /// Returns the number of events dropped during the run. Every other
    /// [`ProgressSender`] clone must already be gone, otherwise the drain
    /// waits for the full `flush_timeout`.
    pub(crate) async fn finish(self, summary: &BatchSummary, flush_timeout: Duration) -> usize {
        let Self { sender, handle } = self;
        let event = ProgressEvent::Finished(Box::new(summary.clone()));
        match tokio::time::timeout(flush_timeout, sender.tx.send(event)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => warn!("progress forwarder stopped before the run finished"),
            Err(_) => warn!("progress reporter too slow; final event dropped"),
        }
        let dropped = sender.dropped.load(Ordering::Relaxed);
        drop(sender);

        if tokio::time::timeout(flush_timeout, handle).await.is_err() {
            warn!("progress reporter did not drain within {flush_timeout:?}");
        }
        if dropped > 0 {
            warn!(dropped, "progress events dropped");
        }
        dropped
    }
}
