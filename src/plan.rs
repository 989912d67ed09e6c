//! Turns pull requests and a requested operation into batch runs.
//!
//! Every operation starts with a fetch phase reading the review threads of
//! each pull request. Mutating operations then derive one target per
//! eligible thread or suggestion and run a second batch. Pull requests whose
//! fetch failed are reported and never mutated. The `report` operation lists
//! the fetched threads that pass the planner's [`ThreadFilter`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::batch::{
    BatchError, BatchExecutor, BatchSummary, OperationKind, ProgressReporter, Target,
};
use crate::error::AppError;
use crate::filter::ThreadFilter;
use crate::github::gateway::GraphqlTransport;
use crate::github::locator::PullRequestLocator;
use crate::github::models::ReviewThread;

/// High-level operation requested by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BatchOperation {
    /// Resolve every unresolved thread whose code has changed.
    ResolveOutdated,
    /// Apply every suggestion found in unresolved threads.
    AcceptSuggestions,
    /// Only collect thread reports.
    #[default]
    Report,
}

impl BatchOperation {
    /// The mutation run after the fetch phase, if any.
    #[must_use]
    pub const fn mutation_kind(self) -> Option<OperationKind> {
        match self {
            Self::ResolveOutdated => Some(OperationKind::ResolveThread),
            Self::AcceptSuggestions => Some(OperationKind::AcceptSuggestion),
            Self::Report => None,
        }
    }

    /// CLI name of the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResolveOutdated => "resolve-outdated",
            Self::AcceptSuggestions => "accept-suggestions",
            Self::Report => "report",
        }
    }
}

impl FromStr for BatchOperation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "resolve-outdated" => Ok(Self::ResolveOutdated),
            "accept-suggestions" => Ok(Self::AcceptSuggestions),
            "report" => Ok(Self::Report),
            _ => Err(AppError::configuration(format!(
                "unsupported operation '{s}': valid options are resolve-outdated, \
                 accept-suggestions, report"
            ))),
        }
    }
}

impl fmt::Display for BatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of planning and running one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutcome {
    /// The requested operation.
    pub operation: BatchOperation,
    /// Summary of the fetch phase.
    pub fetch: BatchSummary,
    /// Mutation targets derived from the fetched threads.
    pub planned: Vec<Target>,
    /// Summary of the mutation phase, when one ran.
    pub mutation: Option<BatchSummary>,
    /// Filter applied to the listed threads.
    pub filter: ThreadFilter,
    /// Threads passing `filter`, listed only by the `report` operation.
    pub listed: Vec<ListedThread>,
}

/// A fetched review thread and the pull request it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedThread {
    /// Pull request carrying the thread.
    pub pull_request: PullRequestLocator,
    /// The thread as fetched.
    pub thread: ReviewThread,
}

impl PlanOutcome {
    /// True when any target in either phase failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.fetch.counts.failed > 0
            || self
                .mutation
                .as_ref()
                .is_some_and(|summary| summary.counts.failed > 0)
    }

    /// The summary users care about: the mutation run when there was one,
    /// the fetch run otherwise.
    #[must_use]
    pub fn primary_summary(&self) -> &BatchSummary {
        self.mutation.as_ref().unwrap_or(&self.fetch)
    }
}

/// Derives mutation targets for `operation` from a fetch summary.
///
/// Only successful fetches contribute targets. Order follows the fetch
/// summary, then thread order within each pull request.
#[must_use]
pub fn plan_targets(operation: BatchOperation, fetch: &BatchSummary) -> Vec<Target> {
    let mut targets = Vec::new();
    for report in &fetch.reports {
        let Some(threads) = report.outcome.thread_report() else {
            continue;
        };
        let pull_request = report.target.pull_request();
        match operation {
            BatchOperation::ResolveOutdated => targets.extend(
                ThreadFilter::UnresolvedOutdated
                    .apply(&threads.threads)
                    .map(|thread| Target::resolve_thread(pull_request.clone(), thread.id.clone())),
            ),
            BatchOperation::AcceptSuggestions => targets.extend(
                ThreadFilter::Unresolved
                    .apply(&threads.threads)
                    .flat_map(|thread| thread.suggestion_ids())
                    .map(|id| Target::accept_suggestion(pull_request.clone(), id)),
            ),
            BatchOperation::Report => {}
        }
    }
    targets
}

/// Lists the threads of every successful fetch that pass `filter`.
///
/// Order follows the fetch summary, then thread order within each pull
/// request.
#[must_use]
pub fn list_threads(filter: ThreadFilter, fetch: &BatchSummary) -> Vec<ListedThread> {
    fetch
        .reports
        .iter()
        .filter_map(|report| {
            report
                .outcome
                .thread_report()
                .map(|threads| (report.target.pull_request(), threads))
        })
        .flat_map(|(pull_request, threads)| {
            filter.apply(&threads.threads).map(move |thread| ListedThread {
                pull_request: pull_request.clone(),
                thread: thread.clone(),
            })
        })
        .collect()
}

/// Runs fetch and mutation phases through one executor.
#[derive(Debug)]
pub struct Planner<T> {
    executor: BatchExecutor<T>,
    filter: ThreadFilter,
}

impl<T: GraphqlTransport + 'static> Planner<T> {
    /// Wraps `executor`, listing every thread for `report`.
    #[must_use]
    pub const fn new(executor: BatchExecutor<T>) -> Self {
        Self {
            executor,
            filter: ThreadFilter::All,
        }
    }

    /// Lists only threads passing `filter` for `report`.
    #[must_use]
    pub const fn with_filter(mut self, filter: ThreadFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Fetches threads for `pull_requests`, then applies `operation`.
    ///
    /// When `cancel` fires during the fetch phase no mutation runs.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] when either phase refuses to run.
    pub async fn run(
        &self,
        pull_requests: Vec<PullRequestLocator>,
        operation: BatchOperation,
        progress: Arc<dyn ProgressReporter>,
        cancel: &CancellationToken,
    ) -> Result<PlanOutcome, BatchError> {
        self.execute(pull_requests, operation, progress, cancel, true)
            .await
    }

    /// Fetches threads and plans mutations without applying them.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] when the fetch phase refuses to run.
    pub async fn preview(
        &self,
        pull_requests: Vec<PullRequestLocator>,
        operation: BatchOperation,
        progress: Arc<dyn ProgressReporter>,
        cancel: &CancellationToken,
    ) -> Result<PlanOutcome, BatchError> {
        self.execute(pull_requests, operation, progress, cancel, false)
            .await
    }

    async fn execute(
        &self,
        pull_requests: Vec<PullRequestLocator>,
        operation: BatchOperation,
        progress: Arc<dyn ProgressReporter>,
        cancel: &CancellationToken,
        apply: bool,
    ) -> Result<PlanOutcome, BatchError> {
        let fetch_targets = pull_requests
            .into_iter()
            .map(Target::fetch_threads)
            .collect();
        let fetch = self
            .executor
            .run_until(
                fetch_targets,
                OperationKind::FetchThreads,
                Arc::clone(&progress),
                cancel,
            )
            .await?;

        let planned = plan_targets(operation, &fetch);
        tracing::info!(%operation, planned = planned.len(), "planned mutations");
        let listed = match operation {
            BatchOperation::Report => list_threads(self.filter, &fetch),
            BatchOperation::ResolveOutdated | BatchOperation::AcceptSuggestions => Vec::new(),
        };

        let mutation = match operation.mutation_kind() {
            Some(kind) if apply && !fetch.cancelled && !cancel.is_cancelled() => Some(
                self.executor
                    .run_until(planned.clone(), kind, progress, cancel)
                    .await?,
            ),
            _ => None,
        };

        Ok(PlanOutcome {
            operation,
            fetch,
            planned,
            mutation,
            filter: self.filter,
            listed,
        })
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
