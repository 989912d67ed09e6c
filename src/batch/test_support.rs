//! Scripted transport for exercising the batch engine without GitHub.
//!
//! Replies are keyed by the node id a request targets (`threadId` or
//! `suggestionId`), or by `repo#number` for thread fetches. Unscripted keys
//! succeed after the default delay.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::time::Instant;

use crate::github::error::GatewayError;
use crate::github::gateway::{GraphqlRequest, GraphqlTransport};

/// Behaviour scripted for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// The operation takes effect.
    Succeed,
    /// GitHub reports the thread or suggestion as already handled.
    AlreadyDone,
    /// GitHub rejects the call for lack of permission.
    Forbidden,
    /// The node no longer exists.
    NotFound,
    /// The connection fails.
    NetworkError,
    /// The connection fails this many times, then the call succeeds.
    FailThenSucceed(u32),
    /// The transport panics mid-call.
    Panic,
}

/// A review thread served by scripted fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadFixture {
    /// Thread node id.
    pub id: String,
    /// Whether the thread is resolved.
    pub resolved: bool,
    /// Whether the thread is outdated.
    pub outdated: bool,
    /// Comment ids carrying suggestion blocks.
    pub suggestion_ids: Vec<String>,
}

impl ThreadFixture {
    /// A thread without suggestions.
    #[must_use]
    pub fn new(id: &str, resolved: bool, outdated: bool) -> Self {
        Self {
            id: id.to_owned(),
            resolved,
            outdated,
            suggestion_ids: Vec::new(),
        }
    }

    /// Adds a suggestion comment with `comment_id`.
    #[must_use]
    pub fn with_suggestion(mut self, comment_id: &str) -> Self {
        self.suggestion_ids.push(comment_id.to_owned());
        self
    }

    fn to_node(&self) -> Value {
        let comments: Vec<Value> = self
            .suggestion_ids
            .iter()
            .map(|comment_id| {
                json!({
                    "id": comment_id,
                    "body": "```suggestion\nreplacement\n```",
                    "author": { "login": "reviewer" },
                    "createdAt": "2025-01-01T00:00:00Z"
                })
            })
            .collect();
        json!({
            "id": self.id,
            "isResolved": self.resolved,
            "isOutdated": self.outdated,
            "path": "src/lib.rs",
            "line": 1,
            "comments": { "nodes": comments }
        })
    }
}

/// One observed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// Key the call targeted.
    pub key: String,
    /// GraphQL operation name.
    pub operation: &'static str,
    /// When the call reached the transport.
    pub started: Instant,
}

#[derive(Debug, Default)]
struct ScriptState {
    calls: Vec<CallRecord>,
    failures_served: HashMap<String, u32>,
    in_flight: usize,
    peak_in_flight: usize,
}

/// In-memory [`GraphqlTransport`] with scripted replies and delays.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    default_delay: Duration,
    replies: HashMap<String, ScriptedReply>,
    delays: HashMap<String, Duration>,
    threads: HashMap<String, Vec<ThreadFixture>>,
    state: Mutex<ScriptState>,
}

impl ScriptedTransport {
    /// Transport where every call takes `default_delay`.
    #[must_use]
    pub fn new(default_delay: Duration) -> Self {
        Self {
            default_delay,
            ..Self::default()
        }
    }

    /// Scripts the reply for `key`.
    #[must_use]
    pub fn with_reply(mut self, key: &str, reply: ScriptedReply) -> Self {
        self.replies.insert(key.to_owned(), reply);
        self
    }

    /// Overrides the call duration for `key`.
    #[must_use]
    pub fn with_delay(mut self, key: &str, delay: Duration) -> Self {
        self.delays.insert(key.to_owned(), delay);
        self
    }

    /// Threads returned when fetching `key` (`repo#number`).
    #[must_use]
    pub fn with_threads(mut self, key: &str, threads: Vec<ThreadFixture>) -> Self {
        self.threads.insert(key.to_owned(), threads);
        self
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Calls observed so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<CallRecord> {
        self.state().calls.clone()
    }

    /// Number of calls observed so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    /// Calls observed for `key`.
    #[must_use]
    pub fn calls_for(&self, key: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.key == key)
            .count()
    }

    /// Highest number of calls outstanding at once.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.state().peak_in_flight
    }

    fn begin(&self, key: &str, operation: &'static str) {
        let mut state = self.state();
        state.calls.push(CallRecord {
            key: key.to_owned(),
            operation,
            started: Instant::now(),
        });
        state.in_flight += 1;
        state.peak_in_flight = state.peak_in_flight.max(state.in_flight);
    }

    fn end(&self) {
        let mut state = self.state();
        state.in_flight = state.in_flight.saturating_sub(1);
    }

    fn should_fail(&self, key: &str, failures: u32) -> bool {
        let mut state = self.state();
        let served = state.failures_served.entry(key.to_owned()).or_insert(0);
        if *served < failures {
            *served += 1;
            true
        } else {
            false
        }
    }

    fn success_body(&self, key: &str, operation: &str) -> Value {
        match operation {
            "ResolveReviewThread" => json!({
                "data": { "resolveReviewThread": { "thread": { "id": key, "isResolved": true } } }
            }),
            "ApplySuggestion" => json!({
                "data": { "applySuggestion": { "success": true, "message": null } }
            }),
            _ => {
                let nodes: Vec<Value> = self
                    .threads
                    .get(key)
                    .map(|threads| threads.iter().map(ThreadFixture::to_node).collect())
                    .unwrap_or_default();
                json!({
                    "data": { "repository": { "pullRequest": { "reviewThreads": {
                        "nodes": nodes,
                        "pageInfo": { "hasNextPage": false, "endCursor": null }
                    } } } }
                })
            }
        }
    }

    fn reply(&self, key: &str, operation: &str) -> Result<Value, GatewayError> {
        let reply = self
            .replies
            .get(key)
            .cloned()
            .unwrap_or(ScriptedReply::Succeed);
        match reply {
            ScriptedReply::Succeed => Ok(self.success_body(key, operation)),
            ScriptedReply::AlreadyDone => Ok(graphql_error(
                "UNPROCESSABLE",
                "Thread is already resolved",
            )),
            ScriptedReply::Forbidden => Ok(graphql_error(
                "FORBIDDEN",
                "Resource not accessible by integration",
            )),
            ScriptedReply::NotFound => Ok(graphql_error(
                "NOT_FOUND",
                "Could not resolve to a node with the given id",
            )),
            ScriptedReply::NetworkError => Err(network_error()),
            ScriptedReply::FailThenSucceed(failures) => {
                if self.should_fail(key, failures) {
                    Err(network_error())
                } else {
                    Ok(self.success_body(key, operation))
                }
            }
            ScriptedReply::Panic => std::panic::resume_unwind(Box::new(format!(
                "scripted transport panic for {key}"
            ))),
        }
    }
}

fn graphql_error(kind: &str, message: &str) -> Value {
    json!({ "data": null, "errors": [{ "type": kind, "message": message }] })
}

fn network_error() -> GatewayError {
    GatewayError::Network {
        message: "connection reset by peer".to_owned(),
    }
}

/// Key a request is scripted under.
fn request_key(request: &GraphqlRequest) -> String {
    let variables = &request.variables;
    let node_id = ["threadId", "suggestionId"]
        .iter()
        .find_map(|name| variables.get(*name).and_then(Value::as_str));
    if let Some(id) = node_id {
        return id.to_owned();
    }
    let repo = variables.get("repo").and_then(Value::as_str).unwrap_or("");
    let number = variables.get("number").and_then(Value::as_u64).unwrap_or(0);
    format!("{repo}#{number}")
}

#[async_trait]
impl GraphqlTransport for ScriptedTransport {
    async fn execute(&self, request: &GraphqlRequest) -> Result<Value, GatewayError> {
        let key = request_key(request);
        self.begin(&key, request.operation_name);
        let delay = self.delays.get(&key).copied().unwrap_or(self.default_delay);
        tokio::time::sleep(delay).await;
        self.end();
        self.reply(&key, request.operation_name)
    }
}
