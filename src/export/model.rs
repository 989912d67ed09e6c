//! Export data models for structured summary output.
//!
//! This module defines the serialisable records written by the JSONL and
//! CSV formatters and the format selection enum for CLI integration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::batch::{BatchSummary, OperationKind, OperationOutcome, SuccessDetail, TargetReport};
use crate::error::AppError;
use crate::github::models::ThreadCounts;
use crate::plan::{BatchOperation, ListedThread, PlanOutcome};

/// Supported export formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// Human-readable Markdown report.
    #[default]
    Markdown,
    /// Machine-readable JSON Lines (one object per line).
    Jsonl,
    /// Spreadsheet-friendly CSV with one row per target.
    Csv,
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "jsonl" | "json-lines" | "jsonlines" => Ok(Self::Jsonl),
            "csv" => Ok(Self::Csv),
            _ => Err(AppError::configuration(format!(
                "unsupported export format '{s}': valid options are 'markdown', 'jsonl' or 'csv'"
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markdown => write!(f, "markdown"),
            Self::Jsonl => write!(f, "jsonl"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// One line of JSONL output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum ExportRecord {
    /// Outcome of a single target.
    Outcome(ExportedOutcome),
    /// Totals for one batch run.
    Summary(ExportedSummary),
    /// A thread listed by the `report` operation.
    Thread(ExportedThread),
    /// Planning result tying the phases together.
    Plan(ExportedPlan),
}

/// A target outcome prepared for export.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExportedOutcome {
    /// Position of the target in its run.
    pub index: usize,
    /// Operation applied to the target.
    pub operation: OperationKind,
    /// Pull request in `owner/repo#number` form.
    pub pull_request: String,
    /// Thread or suggestion node id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// `succeeded`, `failed` or `skipped`.
    pub status: &'static str,
    /// Success label, failure kind or skip reason.
    pub detail: &'static str,
    /// Failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Whether a failure may succeed on retry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
    /// Time spent on the target in milliseconds.
    pub duration_ms: u64,
    /// Thread tallies for successful fetches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<ThreadCounts>,
}

impl From<&TargetReport> for ExportedOutcome {
    fn from(report: &TargetReport) -> Self {
        let (detail, message, retryable) = match &report.outcome {
            OperationOutcome::Succeeded(success) => (success.label(), None, None),
            OperationOutcome::Failed {
                kind,
                message,
                retryable,
            } => (kind.as_str(), Some(message.clone()), Some(*retryable)),
            OperationOutcome::Skipped(reason) => (reason.as_str(), None, None),
        };
        let threads = match &report.outcome {
            OperationOutcome::Succeeded(SuccessDetail::Threads(threads)) => Some(threads.counts),
            _ => None,
        };
        Self {
            index: report.index,
            operation: report.target.kind(),
            pull_request: report.target.pull_request().to_string(),
            node_id: report.target.payload().node_id().map(str::to_owned),
            status: report.outcome.status(),
            detail,
            message,
            retryable,
            duration_ms: millis(report.duration),
            threads,
        }
    }
}

/// Totals of one batch run prepared for export.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExportedSummary {
    /// Operation the run applied.
    pub operation: OperationKind,
    /// Number of submitted targets.
    pub total: usize,
    /// Successful targets, no-ops included.
    pub succeeded: usize,
    /// Successes where nothing changed.
    pub noop: usize,
    /// Failed targets.
    pub failed: usize,
    /// Failures caused by the network or the server.
    pub transport_failures: usize,
    /// Failures caused by missing permission.
    pub forbidden: usize,
    /// Unclassified failures.
    pub unknown_failures: usize,
    /// Targets not attempted.
    pub skipped: usize,
    /// Whole-number success rate, absent for empty runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_rate_percent: Option<usize>,
    /// Run duration in milliseconds.
    pub elapsed_ms: u64,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Whether the run stopped early.
    pub cancelled: bool,
}

impl From<&BatchSummary> for ExportedSummary {
    fn from(summary: &BatchSummary) -> Self {
        let counts = summary.counts;
        Self {
            operation: summary.operation,
            total: summary.total,
            succeeded: counts.succeeded,
            noop: counts.noop,
            failed: counts.failed,
            transport_failures: counts.transport_failures,
            forbidden: counts.forbidden,
            unknown_failures: counts.unknown_failures,
            skipped: counts.skipped,
            success_rate_percent: summary.success_rate_percent(),
            elapsed_ms: millis(summary.elapsed),
            started_at: summary.started_at,
            finished_at: summary.finished_at,
            cancelled: summary.cancelled,
        }
    }
}

/// Planning result prepared for export.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExportedPlan {
    /// Requested operation name.
    pub operation: &'static str,
    /// Number of mutation targets derived from the fetched threads.
    pub planned: usize,
    /// Whether the mutations were applied.
    pub applied: bool,
    /// Thread filter, for the `report` operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<&'static str>,
    /// Number of threads listed by the `report` operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listed: Option<usize>,
}

impl From<&PlanOutcome> for ExportedPlan {
    fn from(outcome: &PlanOutcome) -> Self {
        let report = outcome.operation == BatchOperation::Report;
        Self {
            operation: outcome.operation.as_str(),
            planned: outcome.planned.len(),
            applied: outcome.mutation.is_some(),
            filter: report.then_some(outcome.filter.as_str()),
            listed: report.then_some(outcome.listed.len()),
        }
    }
}

/// A listed review thread prepared for export.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExportedThread {
    /// Pull request in `owner/repo#number` form.
    pub pull_request: String,
    /// Thread node id.
    pub node_id: String,
    /// File the thread is attached to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Line in the diff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Whether the thread is resolved.
    pub is_resolved: bool,
    /// Whether the code under the thread has changed.
    pub is_outdated: bool,
    /// Number of comments in the thread.
    pub comments: usize,
    /// Number of comments carrying a suggestion.
    pub suggestions: usize,
}

impl From<&ListedThread> for ExportedThread {
    fn from(listed: &ListedThread) -> Self {
        let thread = &listed.thread;
        Self {
            pull_request: listed.pull_request.to_string(),
            node_id: thread.id.as_str().to_owned(),
            path: thread.path.clone(),
            line: thread.line,
            is_resolved: thread.is_resolved,
            is_outdated: thread.is_outdated,
            comments: thread.comments.len(),
            suggestions: thread
                .comments
                .iter()
                .filter(|comment| comment.has_suggestion())
                .count(),
        }
    }
}

/// Saturating millisecond count of `duration`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
