//! Issues one remote operation per target and classifies the result.
//!
//! The client never retries and holds no per-call state beyond the injected
//! transport. Every failure mode collapses into an [`OperationOutcome`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::outcome::{FailureKind, OperationOutcome, SkipReason, SuccessDetail};
use super::target::{OperationKind, Target, TargetPayload};
use crate::github::error::GatewayError;
use crate::github::gateway::{GraphqlRequest, GraphqlTransport, documents};
use crate::github::ids::{SuggestionId, ThreadId};
use crate::github::locator::PullRequestLocator;
use crate::github::models::{
    ApiApplySuggestionData, ApiEnvelope, ApiGraphqlError, ApiResolveThreadData, ApiThreadsData,
    ReviewThread, ThreadReport,
};

/// Upper bound on review thread pages read for one pull request.
pub const MAX_THREAD_PAGES: usize = 50;

const SCOPE_HINT: &str = "the token needs the `repo` scope (or pull request write access)";

const ALREADY_DONE_MARKERS: &[&str] = &[
    "already resolved",
    "already been resolved",
    "already applied",
    "already been applied",
    "already accepted",
    "already been accepted",
];

type Step<T> = Result<T, OperationOutcome>;

/// Executes single targets against a [`GraphqlTransport`].
#[derive(Debug)]
pub struct MutationClient<T> {
    transport: T,
    call_timeout: Duration,
}

impl<T: GraphqlTransport> MutationClient<T> {
    /// Wraps `transport`, bounding every remote call by `call_timeout`.
    #[must_use]
    pub const fn new(transport: T, call_timeout: Duration) -> Self {
        Self {
            transport,
            call_timeout,
        }
    }

    /// The per-call timeout.
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Applies the target's operation once and reports what happened.
    pub async fn execute(&self, target: &Target) -> OperationOutcome {
        let result = match target.payload() {
            TargetPayload::ResolveThread { thread_id } => self.resolve_thread(thread_id).await,
            TargetPayload::AcceptSuggestion { suggestion_id } => {
                self.accept_suggestion(suggestion_id).await
            }
            TargetPayload::FetchThreads => self.fetch_threads(target.pull_request()).await,
        };
        let outcome = match result {
            Ok(outcome) | Err(outcome) => outcome,
        };
        debug!(item = %target, outcome = %outcome, "remote call finished");
        outcome
    }

    async fn resolve_thread(&self, thread_id: &ThreadId) -> Step<OperationOutcome> {
        let kind = OperationKind::ResolveThread;
        let body = self.send(&documents::resolve_thread(thread_id)).await?;
        let data: ApiResolveThreadData = decode(kind, body)?;
        let resolved = data
            .resolve_review_thread
            .and_then(|payload| payload.thread)
            .is_some_and(|thread| thread.is_resolved);
        if resolved {
            Ok(OperationOutcome::Succeeded(SuccessDetail::Resolved))
        } else {
            Err(OperationOutcome::failed(
                FailureKind::Unknown,
                format!("thread {thread_id} is still unresolved after the mutation"),
                false,
            ))
        }
    }

    async fn accept_suggestion(&self, suggestion_id: &SuggestionId) -> Step<OperationOutcome> {
        let kind = OperationKind::AcceptSuggestion;
        let body = self.send(&documents::apply_suggestion(suggestion_id)).await?;
        let data: ApiApplySuggestionData = decode(kind, body)?;
        let Some(payload) = data.apply_suggestion else {
            return Err(OperationOutcome::failed(
                FailureKind::Unknown,
                format!("no result returned for suggestion {suggestion_id}"),
                false,
            ));
        };
        if payload.success {
            return Ok(OperationOutcome::Succeeded(SuccessDetail::Accepted));
        }
        let message = payload
            .message
            .unwrap_or_else(|| format!("suggestion {suggestion_id} was not applied"));
        if is_already_done(&message) {
            Ok(OperationOutcome::Succeeded(SuccessDetail::Noop))
        } else {
            Err(OperationOutcome::failed(FailureKind::Unknown, message, false))
        }
    }

    async fn fetch_threads(&self, locator: &PullRequestLocator) -> Step<OperationOutcome> {
        let kind = OperationKind::FetchThreads;
        let mut threads = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_THREAD_PAGES {
            let body = self
                .send(&documents::review_threads(locator, cursor.as_deref()))
                .await?;
            let data: ApiThreadsData = decode(kind, body)?;
            let connection = data
                .repository
                .and_then(|repository| repository.pull_request)
                .map(|pull_request| pull_request.review_threads)
                .ok_or_else(|| {
                    OperationOutcome::failed(
                        FailureKind::Unknown,
                        format!("pull request {locator} not found"),
                        false,
                    )
                })?;

            for node in connection.nodes.into_iter().flatten() {
                let thread = ReviewThread::try_from(node).map_err(|error| {
                    OperationOutcome::failed(FailureKind::Unknown, error.to_string(), false)
                })?;
                threads.push(thread);
            }

            match connection.page_info.end_cursor {
                Some(next) if connection.page_info.has_next_page => cursor = Some(next),
                _ => {
                    return Ok(OperationOutcome::Succeeded(SuccessDetail::Threads(
                        ThreadReport::from_threads(threads),
                    )));
                }
            }
        }

        Err(OperationOutcome::failed(
            FailureKind::Unknown,
            format!("{locator} has more than {MAX_THREAD_PAGES} pages of review threads"),
            false,
        ))
    }

    async fn send(&self, request: &GraphqlRequest) -> Step<Value> {
        match tokio::time::timeout(self.call_timeout, self.transport.execute(request)).await {
            Ok(Ok(body)) => Ok(body),
            Ok(Err(error)) => Err(outcome_for_gateway_error(&error)),
            Err(_) => Err(OperationOutcome::failed(
                FailureKind::Transport,
                format!(
                    "{} timed out after {:?}",
                    request.operation_name, self.call_timeout
                ),
                true,
            )),
        }
    }
}

fn decode<D: DeserializeOwned>(kind: OperationKind, body: Value) -> Step<D> {
    let envelope: ApiEnvelope<D> = serde_json::from_value(body).map_err(|error| {
        OperationOutcome::failed(
            FailureKind::Unknown,
            format!("unexpected {kind} response: {error}"),
            false,
        )
    })?;
    if let Some(outcome) = outcome_for_graphql_errors(kind, &envelope.errors) {
        return Err(outcome);
    }
    envelope.data.ok_or_else(|| {
        OperationOutcome::failed(
            FailureKind::Unknown,
            format!("{kind} response carried no data"),
            false,
        )
    })
}

fn is_already_done(message: &str) -> bool {
    let lowered = message.to_lowercase();
    ALREADY_DONE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

fn has_error_type(errors: &[ApiGraphqlError], wanted: &str) -> bool {
    errors
        .iter()
        .any(|error| error.kind.as_deref() == Some(wanted))
}

fn forbidden(message: &str) -> OperationOutcome {
    OperationOutcome::failed(
        FailureKind::Forbidden,
        format!("{message} ({SCOPE_HINT})"),
        false,
    )
}

/// Maps GraphQL-level errors; `None` when the list is empty.
fn outcome_for_graphql_errors(
    kind: OperationKind,
    errors: &[ApiGraphqlError],
) -> Option<OperationOutcome> {
    if errors.is_empty() {
        return None;
    }
    let message = errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");

    if errors.iter().any(|error| is_already_done(&error.message)) {
        return Some(OperationOutcome::Succeeded(SuccessDetail::Noop));
    }
    if has_error_type(errors, "FORBIDDEN")
        || message.to_lowercase().contains("resource not accessible")
    {
        return Some(forbidden(&message));
    }
    if has_error_type(errors, "RATE_LIMITED") {
        return Some(OperationOutcome::failed(
            FailureKind::Transport,
            message,
            true,
        ));
    }
    if has_error_type(errors, "NOT_FOUND") {
        return Some(if kind.is_mutation() {
            OperationOutcome::Skipped(SkipReason::NotFound)
        } else {
            OperationOutcome::failed(FailureKind::Unknown, message, false)
        });
    }
    Some(OperationOutcome::failed(FailureKind::Unknown, message, false))
}

/// Maps transport-level failures.
fn outcome_for_gateway_error(error: &GatewayError) -> OperationOutcome {
    match error {
        GatewayError::Network { .. }
        | GatewayError::RateLimitExceeded { .. }
        | GatewayError::Server { .. } => {
            OperationOutcome::failed(FailureKind::Transport, error.to_string(), true)
        }
        GatewayError::Authentication { .. } | GatewayError::Forbidden { .. } => {
            forbidden(&error.to_string())
        }
        GatewayError::InvalidUrl(_)
        | GatewayError::MissingPathSegments
        | GatewayError::InvalidPullRequestNumber
        | GatewayError::MissingToken
        | GatewayError::InvalidNodeId { .. }
        | GatewayError::Api { .. }
        | GatewayError::Decode { .. } => {
            OperationOutcome::failed(FailureKind::Unknown, error.to_string(), false)
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
