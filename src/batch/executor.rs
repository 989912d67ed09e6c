//! Fans a target list across a bounded worker pool.
//!
//! Workers share one dequeue cursor, so a slow target never holds back work
//! assigned to a fast worker. Each worker loops: check cancellation, dequeue,
//! acquire a governor ticket, call the client, release the ticket, record
//! the outcome and publish progress. Cancellation is checked only before
//! dequeuing, so every dequeued target is attempted and completes normally.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::aggregator::{BatchSummary, ResultAggregator, TargetReport};
use super::client::MutationClient;
use super::config::BatchConfig;
use super::error::BatchError;
use super::governor::RateGovernor;
use super::outcome::{FailureKind, OperationOutcome, SkipReason};
use super::progress::{
    PROGRESS_CHANNEL_CAPACITY, PROGRESS_FLUSH_TIMEOUT, ProgressForwarder, ProgressReporter,
    ProgressSender,
};
use super::target::{OperationKind, Target};
use crate::github::gateway::GraphqlTransport;

/// Runs batches of targets through a [`MutationClient`].
#[derive(Debug)]
pub struct BatchExecutor<T> {
    client: Arc<MutationClient<T>>,
    config: BatchConfig,
}

impl<T: GraphqlTransport + 'static> BatchExecutor<T> {
    /// Builds an executor whose client uses `config.call_timeout`.
    #[must_use]
    pub fn new(transport: T, config: BatchConfig) -> Self {
        Self {
            client: Arc::new(MutationClient::new(transport, config.call_timeout)),
            config,
        }
    }

    /// Builds an executor around an existing client.
    #[must_use]
    pub const fn with_client(client: Arc<MutationClient<T>>, config: BatchConfig) -> Self {
        Self { client, config }
    }

    /// The limits applied to every run.
    #[must_use]
    pub const fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Runs every target to an outcome with no external cancellation.
    ///
    /// # Errors
    ///
    /// See [`BatchExecutor::run_until`].
    pub async fn run(
        &self,
        targets: Vec<Target>,
        operation: OperationKind,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<BatchSummary, BatchError> {
        self.run_until(targets, operation, progress, &CancellationToken::new())
            .await
    }

    /// Runs every target to an outcome, stopping new work once `cancel`
    /// fires or the configured deadline passes.
    ///
    /// Per-target failures are part of the returned summary. The summary
    /// always holds exactly one report per submitted target.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] when the configuration is unusable or a target
    /// does not match `operation` (both before any remote call), or when
    /// outcome bookkeeping detects an internal inconsistency.
    pub async fn run_until(
        &self,
        targets: Vec<Target>,
        operation: OperationKind,
        progress: Arc<dyn ProgressReporter>,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary, BatchError> {
        self.config.validate()?;
        ensure_operation(&targets, operation)?;

        let submitted: Arc<[Target]> = Arc::from(targets);
        let total = submitted.len();
        let aggregator = Arc::new(ResultAggregator::new(operation, Arc::clone(&submitted)));
        let forwarder = ProgressForwarder::spawn(progress, PROGRESS_CHANNEL_CAPACITY);
        let progress_tx = forwarder.sender();
        progress_tx.started(total);
        tracing::info!(%operation, total, "starting batch run");

        let run_token = cancel.child_token();
        let deadline_task = self.config.deadline.map(|deadline| {
            let token = run_token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                tracing::warn!("batch deadline of {deadline:?} reached; cancelling");
                token.cancel();
            })
        });

        let queue = Arc::new(WorkQueue::new(skip_duplicates(
            &submitted,
            &aggregator,
            &progress_tx,
        )?));
        let context = WorkerContext {
            client: Arc::clone(&self.client),
            governor: RateGovernor::new(self.config.governor_limits()),
            queue: Arc::clone(&queue),
            aggregator: Arc::clone(&aggregator),
            progress: progress_tx.clone(),
            cancel: run_token.clone(),
            read_retries: self.config.read_retries,
        };

        let mut workers = JoinSet::new();
        for _ in 0..self.config.concurrency.min(queue.len()) {
            workers.spawn(context.clone().run());
        }

        let mut internal_error = None;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    tracing::error!("batch worker stopped: {error}");
                    run_token.cancel();
                    internal_error.get_or_insert(error);
                }
                Err(join_error) => {
                    tracing::warn!("batch worker ended abnormally: {join_error}");
                    if !queue.is_drained() && !run_token.is_cancelled() {
                        workers.spawn(context.clone().run());
                    }
                }
            }
        }
        drop(context);
        if let Some(task) = deadline_task {
            task.abort();
        }
        if let Some(error) = internal_error {
            return Err(error);
        }

        let cancelled = run_token.is_cancelled();
        record_unfinished(&aggregator, &queue, &progress_tx)?;
        drop(progress_tx);

        let summary = aggregator.finish(cancelled);
        forwarder.finish(&summary, PROGRESS_FLUSH_TIMEOUT).await;
        tracing::info!(
            %operation,
            succeeded = summary.counts.succeeded,
            failed = summary.counts.failed,
            skipped = summary.counts.skipped,
            cancelled,
            "batch run finished"
        );
        Ok(summary)
    }
}

fn ensure_operation(targets: &[Target], operation: OperationKind) -> Result<(), BatchError> {
    targets
        .iter()
        .enumerate()
        .find(|(_, target)| target.kind() != operation)
        .map_or(Ok(()), |(index, target)| {
            Err(BatchError::OperationMismatch {
                index,
                expected: operation,
                found: target.kind(),
            })
        })
}

/// Records repeated targets as skipped and returns the indices left to run.
fn skip_duplicates(
    targets: &[Target],
    aggregator: &ResultAggregator,
    progress: &ProgressSender,
) -> Result<Vec<usize>, BatchError> {
    let mut seen = HashSet::with_capacity(targets.len());
    let mut order = Vec::with_capacity(targets.len());
    for (index, target) in targets.iter().enumerate() {
        if seen.insert(target) {
            order.push(index);
            continue;
        }
        tracing::debug!("skipping duplicate target {target} at index {index}");
        let report = TargetReport::skipped(index, target.clone(), SkipReason::Duplicate);
        let completed = aggregator.record(report.clone())?;
        progress.item_done(report, completed, targets.len());
    }
    Ok(order)
}

/// Gives every target still without an outcome its terminal state.
fn record_unfinished(
    aggregator: &ResultAggregator,
    queue: &WorkQueue,
    progress: &ProgressSender,
) -> Result<(), BatchError> {
    let pending = aggregator.pending_indices();
    if pending.is_empty() {
        return Ok(());
    }
    let dequeued = queue.dequeued();
    for index in pending {
        let target = aggregator
            .target(index)
            .cloned()
            .ok_or(BatchError::UnknownTargetIndex { index })?;
        let report = if dequeued.contains(&index) {
            TargetReport {
                index,
                target,
                outcome: OperationOutcome::failed(
                    FailureKind::Unknown,
                    "worker stopped before recording an outcome",
                    false,
                ),
                duration: Duration::ZERO,
            }
        } else {
            TargetReport::skipped(index, target, SkipReason::Cancelled)
        };
        let completed = aggregator.record(report.clone())?;
        progress.item_done(report, completed, aggregator.total());
    }
    Ok(())
}

/// Submission indices handed out through one shared cursor.
#[derive(Debug)]
struct WorkQueue {
    order: Vec<usize>,
    cursor: AtomicUsize,
}

impl WorkQueue {
    const fn new(order: Vec<usize>) -> Self {
        Self {
            order,
            cursor: AtomicUsize::new(0),
        }
    }

    const fn len(&self) -> usize {
        self.order.len()
    }

    fn pop(&self) -> Option<usize> {
        let slot = self.cursor.fetch_add(1, Ordering::AcqRel);
        self.order.get(slot).copied()
    }

    fn handed_out(&self) -> usize {
        self.cursor.load(Ordering::Acquire).min(self.order.len())
    }

    fn is_drained(&self) -> bool {
        self.handed_out() == self.order.len()
    }

    fn dequeued(&self) -> HashSet<usize> {
        self.order.iter().take(self.handed_out()).copied().collect()
    }
}

struct WorkerContext<T> {
    client: Arc<MutationClient<T>>,
    governor: RateGovernor,
    queue: Arc<WorkQueue>,
    aggregator: Arc<ResultAggregator>,
    progress: ProgressSender,
    cancel: CancellationToken,
    read_retries: u32,
}

impl<T> Clone for WorkerContext<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            governor: self.governor.clone(),
            queue: Arc::clone(&self.queue),
            aggregator: Arc::clone(&self.aggregator),
            progress: self.progress.clone(),
            cancel: self.cancel.clone(),
            read_retries: self.read_retries,
        }
    }
}

impl<T: GraphqlTransport> WorkerContext<T> {
    async fn run(self) -> Result<(), BatchError> {
        let total = self.aggregator.total();
        while !self.cancel.is_cancelled() {
            let Some(index) = self.queue.pop() else {
                break;
            };
            let target = self
                .aggregator
                .target(index)
                .cloned()
                .ok_or(BatchError::UnknownTargetIndex { index })?;

            let started = Instant::now();
            let outcome = self.process(&target).await;
            let report = TargetReport {
                index,
                target,
                outcome,
                duration: started.elapsed(),
            };
            let completed = self.aggregator.record(report.clone())?;
            self.progress.item_done(report, completed, total);
        }
        Ok(())
    }

    /// Runs one dequeued target to its outcome.
    ///
    /// The governor wait is not cancellable: once a target has left the
    /// queue it is attempted even if the run is cancelled meanwhile.
    async fn process(&self, target: &Target) -> OperationOutcome {
        let mut attempt = 0;
        loop {
            let ticket = self.governor.acquire().await;
            let outcome = self.client.execute(target).await;
            ticket.release();

            let may_retry = target.kind() == OperationKind::FetchThreads
                && outcome.is_retryable()
                && attempt < self.read_retries
                && !self.cancel.is_cancelled();
            if !may_retry {
                return outcome;
            }
            attempt += 1;
            tracing::debug!("retrying {target} (attempt {attempt}): {outcome}");
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
