//! Data models representing review threads and their comments.
//!
//! Types prefixed with `Api` are internal deserialisation targets for GitHub
//! GraphQL responses and convert into the public domain types.

use serde::{Deserialize, Serialize};

use super::error::GatewayError;
use super::ids::{SuggestionId, ThreadId};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Fence marker GitHub uses for suggested changes in review comments.
const SUGGESTION_FENCE: &str = "```suggestion";

/// A comment inside a review thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadComment {
    /// GraphQL node id of the comment.
    pub id: String,
    /// Comment body (Markdown).
    pub body: Option<String>,
    /// Author login.
    pub author: Option<String>,
    /// Creation timestamp (ISO 8601 format).
    pub created_at: Option<String>,
}

impl ThreadComment {
    /// Returns true when the body carries a suggested change block.
    #[must_use]
    pub fn has_suggestion(&self) -> bool {
        self.body
            .as_deref()
            .is_some_and(|body| body.contains(SUGGESTION_FENCE))
    }

    /// Returns the suggestion id when this comment carries a valid suggestion.
    #[must_use]
    pub fn suggestion_id(&self) -> Option<SuggestionId> {
        if !self.has_suggestion() {
            return None;
        }
        SuggestionId::new(&self.id).ok()
    }
}

/// A review thread attached to a pull request diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewThread {
    /// Thread node id.
    pub id: ThreadId,
    /// Whether the thread has been resolved.
    pub is_resolved: bool,
    /// Whether the diff the thread refers to has since changed.
    pub is_outdated: bool,
    /// File path the thread is attached to.
    pub path: Option<String>,
    /// Line number in the diff.
    pub line: Option<u32>,
    /// Comments in the thread, oldest first.
    pub comments: Vec<ThreadComment>,
}

impl ReviewThread {
    /// Suggestion ids carried by comments in this thread.
    #[must_use]
    pub fn suggestion_ids(&self) -> Vec<SuggestionId> {
        self.comments
            .iter()
            .filter_map(ThreadComment::suggestion_id)
            .collect()
    }
}

/// Thread tallies for one pull request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ThreadCounts {
    /// Unresolved threads on current code.
    pub unresolved_active: usize,
    /// Unresolved threads on code that has since changed.
    pub unresolved_outdated: usize,
    /// Resolved threads on current code.
    pub resolved_active: usize,
    /// Resolved threads on code that has since changed.
    pub resolved_outdated: usize,
    /// Suggestion comments across all threads.
    pub suggestions: usize,
}

impl ThreadCounts {
    /// Total number of threads counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.unresolved_active
            + self.unresolved_outdated
            + self.resolved_active
            + self.resolved_outdated
    }
}

/// Review threads fetched for one pull request, with tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadReport {
    /// All review threads in fetch order.
    pub threads: Vec<ReviewThread>,
    /// Tallies derived from `threads`.
    pub counts: ThreadCounts,
}

impl ThreadReport {
    /// Builds a report and its tallies from fetched threads.
    #[must_use]
    pub fn from_threads(threads: Vec<ReviewThread>) -> Self {
        let mut counts = ThreadCounts::default();
        for thread in &threads {
            let bucket = match (thread.is_resolved, thread.is_outdated) {
                (false, false) => &mut counts.unresolved_active,
                (false, true) => &mut counts.unresolved_outdated,
                (true, false) => &mut counts.resolved_active,
                (true, true) => &mut counts.resolved_outdated,
            };
            *bucket += 1;
            counts.suggestions += thread
                .comments
                .iter()
                .filter(|comment| comment.has_suggestion())
                .count();
        }
        Self { threads, counts }
    }
}

/// Top-level GraphQL response envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub(crate) data: Option<T>,
    #[serde(default)]
    pub(crate) errors: Vec<ApiGraphqlError>,
}

/// One entry of the GraphQL `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiGraphqlError {
    pub(crate) message: String,
    #[serde(rename = "type")]
    pub(crate) kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiResolveThreadData {
    pub(crate) resolve_review_thread: Option<ApiResolveThreadPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiResolveThreadPayload {
    pub(crate) thread: Option<ApiResolvedThread>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiResolvedThread {
    pub(crate) is_resolved: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiApplySuggestionData {
    pub(crate) apply_suggestion: Option<ApiApplySuggestionPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiApplySuggestionPayload {
    pub(crate) success: bool,
    pub(crate) message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiThreadsData {
    pub(crate) repository: Option<ApiRepository>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiRepository {
    pub(crate) pull_request: Option<ApiPullRequestThreads>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiPullRequestThreads {
    pub(crate) review_threads: ApiThreadConnection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiThreadConnection {
    #[serde(default)]
    pub(crate) nodes: Vec<Option<ApiReviewThread>>,
    pub(crate) page_info: ApiPageInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiPageInfo {
    pub(crate) has_next_page: bool,
    pub(crate) end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiReviewThread {
    pub(crate) id: String,
    pub(crate) is_resolved: bool,
    pub(crate) is_outdated: bool,
    pub(crate) path: Option<String>,
    pub(crate) line: Option<u32>,
    pub(crate) comments: Option<ApiCommentConnection>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCommentConnection {
    #[serde(default)]
    pub(crate) nodes: Vec<Option<ApiThreadComment>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiThreadComment {
    pub(crate) id: String,
    pub(crate) body: Option<String>,
    pub(crate) author: Option<ApiActor>,
    pub(crate) created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiActor {
    pub(crate) login: Option<String>,
}

impl From<ApiThreadComment> for ThreadComment {
    fn from(value: ApiThreadComment) -> Self {
        Self {
            id: value.id,
            body: value.body,
            author: value.author.and_then(|actor| actor.login),
            created_at: value.created_at,
        }
    }
}

impl TryFrom<ApiReviewThread> for ReviewThread {
    type Error = GatewayError;

    fn try_from(value: ApiReviewThread) -> Result<Self, Self::Error> {
        let comments = value
            .comments
            .map(|connection| {
                connection
                    .nodes
                    .into_iter()
                    .flatten()
                    .map(ThreadComment::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            id: ThreadId::new(&value.id)?,
            is_resolved: value.is_resolved,
            is_outdated: value.is_outdated,
            path: value.path,
            line: value.line,
            comments,
        })
    }
}
