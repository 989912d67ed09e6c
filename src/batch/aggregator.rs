//! Collects per-target outcomes into a [`BatchSummary`].
//!
//! Outcomes arrive in completion order from concurrent workers; the summary
//! always lists them in submission order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use super::error::BatchError;
use super::outcome::{FailureKind, OperationOutcome, SkipReason};
use super::target::{OperationKind, Target};

/// Outcome of one target, with the time spent on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    /// Position of the target in the submitted list.
    pub index: usize,
    /// The target itself.
    pub target: Target,
    /// What happened.
    pub outcome: OperationOutcome,
    /// Time between dequeue and outcome, zero for targets never started.
    pub duration: Duration,
}

impl TargetReport {
    /// A report for a target that never reached the transport.
    #[must_use]
    pub const fn skipped(index: usize, target: Target, reason: SkipReason) -> Self {
        Self {
            index,
            target,
            outcome: OperationOutcome::Skipped(reason),
            duration: Duration::ZERO,
        }
    }
}

/// Outcome tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    /// Targets that succeeded, no-ops included.
    pub succeeded: usize,
    /// Successes where the remote already matched.
    pub noop: usize,
    /// Targets that failed.
    pub failed: usize,
    /// Failures classified as transport problems.
    pub transport_failures: usize,
    /// Failures caused by missing permission.
    pub forbidden: usize,
    /// Failures the client could not classify.
    pub unknown_failures: usize,
    /// Targets not attempted.
    pub skipped: usize,
}

impl OutcomeCounts {
    fn add(&mut self, outcome: &OperationOutcome) {
        match outcome {
            OperationOutcome::Succeeded(_) => {
                self.succeeded += 1;
                if outcome.is_noop() {
                    self.noop += 1;
                }
            }
            OperationOutcome::Failed { kind, .. } => {
                self.failed += 1;
                match kind {
                    FailureKind::Transport => self.transport_failures += 1,
                    FailureKind::Forbidden => self.forbidden += 1,
                    FailureKind::Unknown => self.unknown_failures += 1,
                }
            }
            OperationOutcome::Skipped(_) => self.skipped += 1,
        }
    }

    /// Number of targets with any outcome.
    #[must_use]
    pub const fn recorded(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }
}

/// Aggregate result of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Operation the run applied.
    pub operation: OperationKind,
    /// Number of submitted targets.
    pub total: usize,
    /// Outcome tallies.
    pub counts: OutcomeCounts,
    /// Recorded reports in submission order.
    pub reports: Vec<TargetReport>,
    /// Wall-clock start of the run.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end of the run, once finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// Monotonic time since the run started.
    pub elapsed: Duration,
    /// Whether the run was cancelled or hit its deadline.
    pub cancelled: bool,
}

impl BatchSummary {
    /// Successes as a whole percentage of `total`, `None` for an empty run.
    #[must_use]
    pub fn success_rate_percent(&self) -> Option<usize> {
        (self.counts.succeeded * 100).checked_div(self.total)
    }

    /// True when no target failed.
    #[must_use]
    pub const fn all_succeeded_or_skipped(&self) -> bool {
        self.counts.failed == 0
    }

    /// Failed reports, in submission order.
    pub fn failures(&self) -> impl Iterator<Item = &TargetReport> {
        self.reports
            .iter()
            .filter(|report| matches!(report.outcome, OperationOutcome::Failed { .. }))
    }
}

#[derive(Debug)]
struct AggregatorState {
    slots: Vec<Option<TargetReport>>,
    counts: OutcomeCounts,
}

/// Thread-safe collector of [`TargetReport`]s for one run.
#[derive(Debug)]
pub struct ResultAggregator {
    operation: OperationKind,
    targets: Arc<[Target]>,
    started_at: DateTime<Utc>,
    started: Instant,
    state: Mutex<AggregatorState>,
}

impl ResultAggregator {
    /// Creates an aggregator for `targets`, starting the run clock.
    #[must_use]
    pub fn new(operation: OperationKind, targets: Arc<[Target]>) -> Self {
        let slots = vec![None; targets.len()];
        Self {
            operation,
            targets,
            started_at: Utc::now(),
            started: Instant::now(),
            state: Mutex::new(AggregatorState {
                slots,
                counts: OutcomeCounts::default(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, AggregatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of submitted targets.
    #[must_use]
    pub fn total(&self) -> usize {
        self.targets.len()
    }

    /// The submitted target at `index`.
    #[must_use]
    pub fn target(&self, index: usize) -> Option<&Target> {
        self.targets.get(index)
    }

    /// Stores `report` and returns how many targets now have an outcome.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::UnknownTargetIndex`] when the index is outside
    /// the run and [`BatchError::DuplicateOutcome`] when it already has an
    /// outcome. Either indicates a bug in the caller.
    pub fn record(&self, report: TargetReport) -> Result<usize, BatchError> {
        let index = report.index;
        let mut state = self.state();
        let slot = state
            .slots
            .get_mut(index)
            .ok_or(BatchError::UnknownTargetIndex { index })?;
        if slot.is_some() {
            return Err(BatchError::DuplicateOutcome { index });
        }
        let outcome = report.outcome.clone();
        *slot = Some(report);
        state.counts.add(&outcome);
        Ok(state.counts.recorded())
    }

    /// Whether `index` already has an outcome.
    #[must_use]
    pub fn is_recorded(&self, index: usize) -> bool {
        self.state()
            .slots
            .get(index)
            .is_some_and(Option::is_some)
    }

    /// Indices without an outcome, ascending.
    #[must_use]
    pub fn pending_indices(&self) -> Vec<usize> {
        self.state()
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.is_none().then_some(index))
            .collect()
    }

    /// Current summary; unrecorded targets are omitted from `reports`.
    #[must_use]
    pub fn snapshot(&self) -> BatchSummary {
        self.build(None, false)
    }

    /// Final summary, stamping the finish time.
    #[must_use]
    pub fn finish(&self, cancelled: bool) -> BatchSummary {
        self.build(Some(Utc::now()), cancelled)
    }

    fn build(&self, finished_at: Option<DateTime<Utc>>, cancelled: bool) -> BatchSummary {
        let state = self.state();
        BatchSummary {
            operation: self.operation,
            total: self.targets.len(),
            counts: state.counts,
            reports: state.slots.iter().flatten().cloned().collect(),
            started_at: self.started_at,
            finished_at,
            elapsed: self.started.elapsed(),
            cancelled,
        }
    }
}
