//! Tests for outcome classification in the mutation client.

use std::time::Duration;

use async_trait::async_trait;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::MutationClient;
use crate::batch::outcome::{FailureKind, OperationOutcome, SkipReason, SuccessDetail};
use crate::batch::target::Target;
use crate::github::error::GatewayError;
use crate::github::gateway::{GraphqlRequest, GraphqlTransport, MockGraphqlTransport};
use crate::github::ids::{SuggestionId, ThreadId};
use crate::github::locator::PullRequestLocator;

const TIMEOUT: Duration = Duration::from_secs(5);

#[fixture]
fn pr() -> PullRequestLocator {
    PullRequestLocator::parse("https://github.com/octo/repo/pull/42").expect("locator parses")
}

fn resolve_target(pr: PullRequestLocator) -> Target {
    Target::resolve_thread(pr, ThreadId::new("PRRT_1").expect("valid id"))
}

fn accept_target(pr: PullRequestLocator) -> Target {
    Target::accept_suggestion(pr, SuggestionId::new("PRRC_1").expect("valid id"))
}

fn client_returning(body: Value) -> MutationClient<MockGraphqlTransport> {
    let mut transport = MockGraphqlTransport::new();
    transport
        .expect_execute()
        .times(1)
        .returning(move |_| Ok(body.clone()));
    MutationClient::new(transport, TIMEOUT)
}

fn client_failing(error: GatewayError) -> MutationClient<MockGraphqlTransport> {
    let mut transport = MockGraphqlTransport::new();
    transport
        .expect_execute()
        .times(1)
        .returning(move |_| Err(error.clone()));
    MutationClient::new(transport, TIMEOUT)
}

fn graphql_error(kind: &str, message: &str) -> Value {
    json!({ "data": null, "errors": [{ "type": kind, "message": message }] })
}

#[rstest]
#[tokio::test]
async fn resolve_reports_resolved_when_thread_flips(pr: PullRequestLocator) {
    let client = client_returning(json!({
        "data": { "resolveReviewThread": { "thread": { "id": "PRRT_1", "isResolved": true } } }
    }));

    let outcome = client.execute(&resolve_target(pr)).await;

    assert_eq!(outcome, OperationOutcome::Succeeded(SuccessDetail::Resolved));
}

#[rstest]
#[case::resolved("Thread is already resolved")]
#[case::applied("This suggestion has already been applied")]
#[case::accepted("Suggestion already accepted")]
#[tokio::test]
async fn already_done_errors_become_noop(pr: PullRequestLocator, #[case] message: &str) {
    let client = client_returning(graphql_error("UNPROCESSABLE", message));

    let outcome = client.execute(&resolve_target(pr)).await;

    assert!(outcome.is_noop(), "expected noop, got {outcome}");
}

#[rstest]
#[tokio::test]
async fn accept_reports_accepted_on_success(pr: PullRequestLocator) {
    let client = client_returning(json!({
        "data": { "applySuggestion": { "success": true, "message": null } }
    }));

    let outcome = client.execute(&accept_target(pr)).await;

    assert_eq!(outcome, OperationOutcome::Succeeded(SuccessDetail::Accepted));
}

#[rstest]
#[tokio::test]
async fn accept_failure_mentioning_already_applied_is_noop(pr: PullRequestLocator) {
    let client = client_returning(json!({
        "data": { "applySuggestion": { "success": false, "message": "Already applied" } }
    }));

    let outcome = client.execute(&accept_target(pr)).await;

    assert!(outcome.is_noop());
}

#[rstest]
#[tokio::test]
async fn accept_failure_with_other_message_is_unknown(pr: PullRequestLocator) {
    let client = client_returning(json!({
        "data": { "applySuggestion": { "success": false, "message": "merge conflict" } }
    }));

    let outcome = client.execute(&accept_target(pr)).await;

    assert_eq!(
        outcome,
        OperationOutcome::failed(FailureKind::Unknown, "merge conflict", false)
    );
}

#[rstest]
#[case::graphql_type(graphql_error("FORBIDDEN", "Not allowed"))]
#[case::integration_message(graphql_error("UNPROCESSABLE", "Resource not accessible by integration"))]
#[tokio::test]
async fn permission_errors_are_forbidden_with_scope_hint(
    pr: PullRequestLocator,
    #[case] body: Value,
) {
    let client = client_returning(body);

    let outcome = client.execute(&resolve_target(pr)).await;

    let OperationOutcome::Failed {
        kind,
        message,
        retryable,
    } = outcome
    else {
        panic!("expected failure, got {outcome}");
    };
    assert_eq!(kind, FailureKind::Forbidden);
    assert!(!retryable);
    assert!(message.contains("`repo` scope"), "message: {message}");
}

#[rstest]
#[tokio::test]
async fn not_found_on_mutation_is_skipped(pr: PullRequestLocator) {
    let client = client_returning(graphql_error(
        "NOT_FOUND",
        "Could not resolve to a node with the global id of 'PRRT_1'",
    ));

    let outcome = client.execute(&resolve_target(pr)).await;

    assert_eq!(outcome, OperationOutcome::Skipped(SkipReason::NotFound));
}

#[rstest]
#[tokio::test]
async fn not_found_on_fetch_is_unknown_failure(pr: PullRequestLocator) {
    let client = client_returning(graphql_error(
        "NOT_FOUND",
        "Could not resolve to a Repository",
    ));

    let outcome = client.execute(&Target::fetch_threads(pr)).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::Unknown));
    assert!(!outcome.is_retryable());
}

#[rstest]
#[tokio::test]
async fn graphql_rate_limit_is_retryable_transport(pr: PullRequestLocator) {
    let client = client_returning(graphql_error("RATE_LIMITED", "API rate limit exceeded"));

    let outcome = client.execute(&Target::fetch_threads(pr)).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::Transport));
    assert!(outcome.is_retryable());
}

#[rstest]
#[tokio::test]
async fn unparseable_payload_is_unknown(pr: PullRequestLocator) {
    let client = client_returning(json!({ "data": { "resolveReviewThread": "nonsense" } }));

    let outcome = client.execute(&resolve_target(pr)).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::Unknown));
}

#[rstest]
#[case::network(GatewayError::Network { message: "reset".to_owned() }, FailureKind::Transport, true)]
#[case::throttled(GatewayError::RateLimitExceeded { message: "slow down".to_owned() }, FailureKind::Transport, true)]
#[case::server(GatewayError::Server { status: 502, message: "bad gateway".to_owned() }, FailureKind::Transport, true)]
#[case::auth(GatewayError::Authentication { message: "bad credentials".to_owned() }, FailureKind::Forbidden, false)]
#[case::forbidden(GatewayError::Forbidden { message: "nope".to_owned() }, FailureKind::Forbidden, false)]
#[case::api(GatewayError::Api { message: "teapot".to_owned() }, FailureKind::Unknown, false)]
#[case::decode(GatewayError::Decode { message: "eof".to_owned() }, FailureKind::Unknown, false)]
#[tokio::test]
async fn transport_errors_are_classified(
    pr: PullRequestLocator,
    #[case] error: GatewayError,
    #[case] expected_kind: FailureKind,
    #[case] expected_retryable: bool,
) {
    let client = client_failing(error);

    let outcome = client.execute(&resolve_target(pr)).await;

    assert_eq!(outcome.failure_kind(), Some(expected_kind));
    assert_eq!(outcome.is_retryable(), expected_retryable);
}

fn thread_page(ids: &[&str], next: Option<&str>) -> Value {
    let nodes: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "isResolved": false,
                "isOutdated": true,
                "path": "src/main.rs",
                "line": 3,
                "comments": { "nodes": [
                    { "id": format!("C_{id}"), "body": "```suggestion\nfoo\n```", "author": null, "createdAt": null }
                ] }
            })
        })
        .collect();
    json!({
        "data": { "repository": { "pullRequest": { "reviewThreads": {
            "nodes": nodes,
            "pageInfo": { "hasNextPage": next.is_some(), "endCursor": next }
        } } } }
    })
}

fn cursor_of(request: &GraphqlRequest) -> Option<String> {
    request
        .variables
        .get("cursor")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

#[rstest]
#[tokio::test]
async fn fetch_follows_page_cursors(pr: PullRequestLocator) {
    let mut transport = MockGraphqlTransport::new();
    transport
        .expect_execute()
        .withf(|request| cursor_of(request).is_none())
        .times(1)
        .returning(|_| Ok(thread_page(&["T1", "T2"], Some("CUR1"))));
    transport
        .expect_execute()
        .withf(|request| cursor_of(request).as_deref() == Some("CUR1"))
        .times(1)
        .returning(|_| Ok(thread_page(&["T3"], None)));
    let client = MutationClient::new(transport, TIMEOUT);

    let outcome = client.execute(&Target::fetch_threads(pr)).await;

    let report = outcome.thread_report().expect("fetch should succeed");
    let ids: Vec<&str> = report.threads.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["T1", "T2", "T3"]);
    assert_eq!(report.counts.unresolved_outdated, 3);
    assert_eq!(report.counts.suggestions, 3);
}

#[rstest]
#[tokio::test]
async fn fetch_of_missing_pull_request_fails(pr: PullRequestLocator) {
    let client = client_returning(json!({ "data": { "repository": { "pullRequest": null } } }));

    let outcome = client.execute(&Target::fetch_threads(pr)).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::Unknown));
}

struct StalledTransport;

#[async_trait]
impl GraphqlTransport for StalledTransport {
    async fn execute(&self, _request: &GraphqlRequest) -> Result<Value, GatewayError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Value::Null)
    }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn slow_calls_time_out_as_retryable_transport(pr: PullRequestLocator) {
    let client = MutationClient::new(StalledTransport, Duration::from_secs(2));

    let outcome = client.execute(&resolve_target(pr)).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::Transport));
    assert!(outcome.is_retryable());
}
