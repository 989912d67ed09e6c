//! Units of batch work.

use std::fmt;

use serde::Serialize;

use crate::github::ids::{SuggestionId, ThreadId};
use crate::github::locator::PullRequestLocator;

/// Remote operation applied to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    /// Mark a review thread as resolved.
    ResolveThread,
    /// Apply a suggested change from a review comment.
    AcceptSuggestion,
    /// Read all review threads of a pull request.
    FetchThreads,
}

impl OperationKind {
    /// Returns true for operations that change remote state.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        matches!(self, Self::ResolveThread | Self::AcceptSuggestion)
    }

    /// Stable kebab-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResolveThread => "resolve-thread",
            Self::AcceptSuggestion => "accept-suggestion",
            Self::FetchThreads => "fetch-threads",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Operation-specific payload carried by a [`Target`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetPayload {
    /// Resolve the given thread.
    ResolveThread {
        /// Thread to resolve.
        thread_id: ThreadId,
    },
    /// Apply the given suggestion.
    AcceptSuggestion {
        /// Suggestion comment to apply.
        suggestion_id: SuggestionId,
    },
    /// Fetch the pull request's review threads.
    FetchThreads,
}

impl TargetPayload {
    /// The operation this payload drives.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::ResolveThread { .. } => OperationKind::ResolveThread,
            Self::AcceptSuggestion { .. } => OperationKind::AcceptSuggestion,
            Self::FetchThreads => OperationKind::FetchThreads,
        }
    }

    /// The node id the operation acts on, when it has one.
    #[must_use]
    pub const fn node_id(&self) -> Option<&str> {
        match self {
            Self::ResolveThread { thread_id } => Some(thread_id.as_str()),
            Self::AcceptSuggestion { suggestion_id } => Some(suggestion_id.as_str()),
            Self::FetchThreads => None,
        }
    }
}

/// One unit of batch work: a pull request plus an operation payload.
///
/// Targets are immutable once enqueued. Equality and hashing cover the pull
/// request, the operation kind and the payload id, which is the identity the
/// executor uses to refuse applying a mutation twice in one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pull_request: PullRequestLocator,
    payload: TargetPayload,
}

impl Target {
    /// Creates a target from its parts.
    #[must_use]
    pub const fn new(pull_request: PullRequestLocator, payload: TargetPayload) -> Self {
        Self {
            pull_request,
            payload,
        }
    }

    /// Target resolving `thread_id` on `pull_request`.
    #[must_use]
    pub const fn resolve_thread(pull_request: PullRequestLocator, thread_id: ThreadId) -> Self {
        Self::new(pull_request, TargetPayload::ResolveThread { thread_id })
    }

    /// Target applying `suggestion_id` on `pull_request`.
    #[must_use]
    pub const fn accept_suggestion(
        pull_request: PullRequestLocator,
        suggestion_id: SuggestionId,
    ) -> Self {
        Self::new(pull_request, TargetPayload::AcceptSuggestion { suggestion_id })
    }

    /// Target fetching the threads of `pull_request`.
    #[must_use]
    pub const fn fetch_threads(pull_request: PullRequestLocator) -> Self {
        Self::new(pull_request, TargetPayload::FetchThreads)
    }

    /// The pull request this target belongs to.
    #[must_use]
    pub const fn pull_request(&self) -> &PullRequestLocator {
        &self.pull_request
    }

    /// The operation payload.
    #[must_use]
    pub const fn payload(&self) -> &TargetPayload {
        &self.payload
    }

    /// Shorthand for `self.payload().kind()`.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        self.payload.kind()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.payload.node_id() {
            Some(node_id) => write!(formatter, "{} {} {node_id}", self.pull_request, self.kind()),
            None => write!(formatter, "{} {}", self.pull_request, self.kind()),
        }
    }
}
