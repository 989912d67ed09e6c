//! Terminal results of applying one operation to one target.

use std::fmt;

use serde::Serialize;

use crate::github::models::ThreadReport;

/// What a successful operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuccessDetail {
    /// The thread was resolved by this run.
    Resolved,
    /// The suggestion was applied by this run.
    Accepted,
    /// The remote state already matched; nothing changed.
    Noop,
    /// Review threads were fetched.
    Threads(ThreadReport),
}

impl SuccessDetail {
    /// Short label used in reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Resolved => "resolved",
            Self::Accepted => "accepted",
            Self::Noop => "noop",
            Self::Threads(_) => "fetched",
        }
    }
}

/// Classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network failure, timeout, throttling or a server-side error.
    Transport,
    /// The token lacks the permission the operation needs.
    Forbidden,
    /// Anything the client could not classify.
    Unknown,
}

impl FailureKind {
    /// Short label used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Forbidden => "forbidden",
            Self::Unknown => "unknown",
        }
    }
}

/// Why a target was not executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The run was cancelled before the target was dequeued.
    Cancelled,
    /// The same target appeared earlier in the submission.
    Duplicate,
    /// The thread or suggestion no longer exists remotely.
    NotFound,
}

impl SkipReason {
    /// Short label used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::Duplicate => "duplicate",
            Self::NotFound => "not_found",
        }
    }
}

/// Outcome of one target in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    /// The operation took effect or was already in effect.
    Succeeded(SuccessDetail),
    /// The operation failed.
    Failed {
        /// Failure classification.
        kind: FailureKind,
        /// Human-readable detail.
        message: String,
        /// Whether repeating the call could succeed.
        retryable: bool,
    },
    /// The operation was not attempted.
    Skipped(SkipReason),
}

impl OperationOutcome {
    /// Builds a failed outcome.
    pub fn failed(kind: FailureKind, message: impl Into<String>, retryable: bool) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
            retryable,
        }
    }

    /// True for [`OperationOutcome::Succeeded`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// True when the remote already matched the requested state.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::Succeeded(SuccessDetail::Noop))
    }

    /// True for failures flagged as retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Failed {
                retryable: true,
                ..
            }
        )
    }

    /// The failure kind, when this outcome is a failure.
    #[must_use]
    pub const fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Failed { kind, .. } => Some(*kind),
            Self::Succeeded(_) | Self::Skipped(_) => None,
        }
    }

    /// The thread report carried by a successful fetch.
    #[must_use]
    pub const fn thread_report(&self) -> Option<&ThreadReport> {
        match self {
            Self::Succeeded(SuccessDetail::Threads(report)) => Some(report),
            _ => None,
        }
    }

    /// Status column value: `succeeded`, `failed` or `skipped`.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Succeeded(_) => "succeeded",
            Self::Failed { .. } => "failed",
            Self::Skipped(_) => "skipped",
        }
    }
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded(detail) => write!(formatter, "succeeded ({})", detail.label()),
            Self::Failed { kind, message, .. } => {
                write!(formatter, "failed ({}): {message}", kind.as_str())
            }
            Self::Skipped(reason) => write!(formatter, "skipped ({})", reason.as_str()),
        }
    }
}
