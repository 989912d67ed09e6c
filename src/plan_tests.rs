//! Tests for operation planning.

use std::sync::Arc;
use std::time::Duration;

use rstest::{fixture, rstest};
use tokio_util::sync::CancellationToken;

use super::{BatchOperation, Planner, list_threads, plan_targets};
use crate::batch::test_support::{ScriptedReply, ScriptedTransport, ThreadFixture};
use crate::batch::{
    BatchConfig, BatchExecutor, NoopProgress, OperationKind, ProgressReporter, ResultAggregator,
    Target,
};
use crate::error::AppError;
use crate::filter::ThreadFilter;
use crate::github::locator::PullRequestLocator;

fn locator(number: u64) -> PullRequestLocator {
    PullRequestLocator::parse(&format!("https://github.com/octo/repo/pull/{number}"))
        .expect("locator parses")
}

fn noop() -> Arc<dyn ProgressReporter> {
    Arc::new(NoopProgress)
}

#[fixture]
fn transport() -> Arc<ScriptedTransport> {
    Arc::new(
        ScriptedTransport::new(Duration::from_millis(20))
            .with_threads(
                "repo#1",
                vec![
                    ThreadFixture::new("PRRT_open_old", false, true).with_suggestion("PRRC_a"),
                    ThreadFixture::new("PRRT_open_new", false, false).with_suggestion("PRRC_b"),
                    ThreadFixture::new("PRRT_closed_old", true, true).with_suggestion("PRRC_c"),
                ],
            )
            .with_reply("repo#2", ScriptedReply::NetworkError)
            .with_threads(
                "repo#2",
                vec![ThreadFixture::new("PRRT_never", false, true)],
            ),
    )
}

fn planner(transport: &Arc<ScriptedTransport>) -> Planner<Arc<ScriptedTransport>> {
    Planner::new(BatchExecutor::new(
        Arc::clone(transport),
        BatchConfig::default(),
    ))
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn resolve_outdated_targets_only_open_outdated_threads(transport: Arc<ScriptedTransport>) {
    let outcome = planner(&transport)
        .run(
            vec![locator(1), locator(2)],
            BatchOperation::ResolveOutdated,
            noop(),
            &CancellationToken::new(),
        )
        .await
        .expect("plan runs");

    assert_eq!(outcome.fetch.counts.succeeded, 1);
    assert_eq!(outcome.fetch.counts.transport_failures, 1);
    let planned: Vec<&str> = outcome
        .planned
        .iter()
        .filter_map(|target| target.payload().node_id())
        .collect();
    assert_eq!(planned, vec!["PRRT_open_old"]);

    let mutation = outcome.mutation.as_ref().expect("mutation phase ran");
    assert_eq!(mutation.operation, OperationKind::ResolveThread);
    assert_eq!(mutation.counts.succeeded, 1);
    assert_eq!(transport.calls_for("PRRT_never"), 0);
    assert!(outcome.has_failures(), "the failed fetch is reported");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn accept_suggestions_skips_resolved_threads(transport: Arc<ScriptedTransport>) {
    let outcome = planner(&transport)
        .run(
            vec![locator(1)],
            BatchOperation::AcceptSuggestions,
            noop(),
            &CancellationToken::new(),
        )
        .await
        .expect("plan runs");

    let planned: Vec<&str> = outcome
        .planned
        .iter()
        .filter_map(|target| target.payload().node_id())
        .collect();
    assert_eq!(planned, vec!["PRRC_a", "PRRC_b"]);
    let mutation = outcome.mutation.as_ref().expect("mutation phase ran");
    assert_eq!(mutation.counts.succeeded, 2);
    assert!(!outcome.has_failures());
    assert_eq!(outcome.primary_summary(), mutation);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn preview_plans_without_mutating(transport: Arc<ScriptedTransport>) {
    let outcome = planner(&transport)
        .preview(
            vec![locator(1)],
            BatchOperation::ResolveOutdated,
            noop(),
            &CancellationToken::new(),
        )
        .await
        .expect("preview runs");

    assert_eq!(outcome.planned.len(), 1);
    assert!(outcome.mutation.is_none());
    assert_eq!(transport.calls_for("PRRT_open_old"), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn report_only_fetches(transport: Arc<ScriptedTransport>) {
    let outcome = planner(&transport)
        .run(
            vec![locator(1)],
            BatchOperation::Report,
            noop(),
            &CancellationToken::new(),
        )
        .await
        .expect("report runs");

    assert!(outcome.planned.is_empty());
    assert!(outcome.mutation.is_none());
    assert_eq!(transport.call_count(), 1);
    let threads = outcome
        .fetch
        .reports
        .first()
        .and_then(|report| report.outcome.thread_report())
        .expect("fetch succeeded");
    assert_eq!(threads.counts.total(), 3);
    assert_eq!(outcome.filter, ThreadFilter::All);
    assert_eq!(outcome.listed.len(), 3);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn report_lists_only_threads_passing_the_filter(transport: Arc<ScriptedTransport>) {
    let outcome = planner(&transport)
        .with_filter(ThreadFilter::CurrentUnresolved)
        .run(
            vec![locator(1), locator(2)],
            BatchOperation::Report,
            noop(),
            &CancellationToken::new(),
        )
        .await
        .expect("report runs");

    assert_eq!(outcome.filter, ThreadFilter::CurrentUnresolved);
    let listed: Vec<&str> = outcome
        .listed
        .iter()
        .map(|listed| listed.thread.id.as_str())
        .collect();
    assert_eq!(listed, vec!["PRRT_open_new"]);
    assert!(
        outcome
            .listed
            .iter()
            .all(|listed| listed.pull_request == locator(1))
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn mutating_operations_list_no_threads(transport: Arc<ScriptedTransport>) {
    let outcome = planner(&transport)
        .with_filter(ThreadFilter::Unresolved)
        .run(
            vec![locator(1)],
            BatchOperation::ResolveOutdated,
            noop(),
            &CancellationToken::new(),
        )
        .await
        .expect("plan runs");

    assert!(outcome.listed.is_empty());
}

#[rstest]
#[tokio::test]
async fn cancelled_fetch_skips_mutation_phase(transport: Arc<ScriptedTransport>) {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = planner(&transport)
        .run(
            vec![locator(1)],
            BatchOperation::ResolveOutdated,
            noop(),
            &cancel,
        )
        .await
        .expect("cancelled plan still returns");

    assert!(outcome.fetch.cancelled);
    assert!(outcome.mutation.is_none());
    assert_eq!(transport.call_count(), 0);
}

#[rstest]
fn empty_fetch_plans_nothing() {
    let summary = ResultAggregator::new(
        OperationKind::FetchThreads,
        Arc::from(Vec::<Target>::new()),
    )
    .finish(false);

    assert!(plan_targets(BatchOperation::ResolveOutdated, &summary).is_empty());
    assert!(list_threads(ThreadFilter::All, &summary).is_empty());
}

#[rstest]
#[case("resolve-outdated", BatchOperation::ResolveOutdated)]
#[case("accept_suggestions", BatchOperation::AcceptSuggestions)]
#[case("REPORT", BatchOperation::Report)]
fn operation_parses_cli_names(#[case] input: &str, #[case] expected: BatchOperation) {
    assert_eq!(input.parse::<BatchOperation>(), Ok(expected));
}

#[rstest]
fn unknown_operation_is_rejected() {
    let error = "merge"
        .parse::<BatchOperation>()
        .expect_err("unknown operation");
    assert!(matches!(error, AppError::Configuration { .. }));
}
