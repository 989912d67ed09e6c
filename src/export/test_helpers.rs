//! Shared fixtures for export tests.

use std::sync::Arc;
use std::time::Duration;

use crate::batch::{
    BatchSummary, FailureKind, OperationKind, OperationOutcome, ResultAggregator, SkipReason,
    SuccessDetail, Target, TargetReport,
};
use crate::filter::ThreadFilter;
use crate::github::ids::ThreadId;
use crate::github::locator::PullRequestLocator;
use crate::github::models::ThreadReport;
use crate::github::models::test_support::{remark_comment, suggestion_comment, thread_with_state};
use crate::plan::{BatchOperation, ListedThread, PlanOutcome};

/// A locator for `octo/repo#number`.
pub fn locator(number: u64) -> PullRequestLocator {
    PullRequestLocator::parse(&format!("https://github.com/octo/repo/pull/{number}"))
        .expect("valid locator")
}

fn resolve(number: u64, thread: &str) -> Target {
    Target::resolve_thread(locator(number), ThreadId::new(thread).expect("valid thread id"))
}

/// Builds a finished summary from `(target, outcome)` pairs.
pub fn summary_of(operation: OperationKind, entries: Vec<(Target, OperationOutcome)>) -> BatchSummary {
    let targets: Arc<[Target]> = entries.iter().map(|(target, _)| target.clone()).collect();
    let aggregator = ResultAggregator::new(operation, targets);
    for (index, (target, outcome)) in entries.into_iter().enumerate() {
        aggregator
            .record(TargetReport {
                index,
                target,
                outcome,
                duration: Duration::from_millis(20),
            })
            .expect("fresh index");
    }
    let mut summary = aggregator.finish(false);
    summary.elapsed = Duration::from_millis(1500);
    summary
}

/// One resolved, one forbidden and one cancelled thread.
pub fn mixed_summary() -> BatchSummary {
    summary_of(
        OperationKind::ResolveThread,
        vec![
            (
                resolve(1, "PRRT_one"),
                OperationOutcome::Succeeded(SuccessDetail::Resolved),
            ),
            (
                resolve(1, "PRRT_two"),
                OperationOutcome::failed(
                    FailureKind::Forbidden,
                    "token lacks the `repo` scope | denied",
                    false,
                ),
            ),
            (
                resolve(2, "PRRT_three"),
                OperationOutcome::Skipped(SkipReason::Cancelled),
            ),
        ],
    )
}

/// A single successful fetch with an empty thread report.
pub fn fetch_summary() -> BatchSummary {
    summary_of(
        OperationKind::FetchThreads,
        vec![(
            Target::fetch_threads(locator(1)),
            OperationOutcome::Succeeded(SuccessDetail::Threads(ThreadReport::default())),
        )],
    )
}

/// An unresolved outdated thread on `octo/repo#1` with one suggestion.
pub fn listed_thread() -> ListedThread {
    let mut thread = thread_with_state("PRRT_listed", false, true);
    thread.comments.push(remark_comment("PRRC_note", "please rename"));
    thread.comments.push(suggestion_comment("PRRC_fix"));
    ListedThread {
        pull_request: locator(1),
        thread,
    }
}

/// A `report` outcome listing `listed` under the `unresolved` filter.
pub fn report_plan(listed: Vec<ListedThread>) -> PlanOutcome {
    PlanOutcome {
        operation: BatchOperation::Report,
        fetch: fetch_summary(),
        planned: Vec::new(),
        mutation: None,
        filter: ThreadFilter::Unresolved,
        listed,
    }
}

/// A plan for `operation` with the given phases and nothing listed.
pub fn plan_of(
    operation: BatchOperation,
    planned: Vec<Target>,
    mutation: Option<BatchSummary>,
) -> PlanOutcome {
    PlanOutcome {
        operation,
        fetch: fetch_summary(),
        planned,
        mutation,
        filter: ThreadFilter::All,
        listed: Vec::new(),
    }
}

/// The report at `index`.
pub fn report_for(summary: &BatchSummary, index: usize) -> &TargetReport {
    summary
        .reports
        .get(index)
        .expect("report exists at index")
}

/// Asserts that `output` contains `needle`, showing the output otherwise.
pub fn assert_contains(output: &str, needle: &str) {
    assert!(
        output.contains(needle),
        "expected output to contain {needle:?}\n--- output ---\n{output}"
    );
}
