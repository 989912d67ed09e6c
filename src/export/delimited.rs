//! CSV formatter for batch summaries.
//!
//! Writes a header row, then one row per target in submission order and a
//! closing `summary` row for each run. Quoting of commas, quotes and line
//! breaks in remote messages is left to the `csv` writer.

use std::io::Write;

use csv::WriterBuilder;
use serde::Serialize;

use crate::batch::BatchSummary;
use crate::error::AppError;
use crate::plan::PlanOutcome;

use super::model::{ExportedOutcome, millis};

const HEADER: [&str; 8] = [
    "operation",
    "index",
    "pull_request",
    "node_id",
    "status",
    "detail",
    "message",
    "duration_ms",
];

/// One CSV row; field order matches [`HEADER`].
#[derive(Debug, Serialize)]
struct Row {
    operation: &'static str,
    index: Option<usize>,
    pull_request: Option<String>,
    node_id: Option<String>,
    status: &'static str,
    detail: String,
    message: Option<String>,
    duration_ms: u64,
}

impl From<ExportedOutcome> for Row {
    fn from(outcome: ExportedOutcome) -> Self {
        Self {
            operation: outcome.operation.as_str(),
            index: Some(outcome.index),
            pull_request: Some(outcome.pull_request),
            node_id: outcome.node_id,
            status: outcome.status,
            detail: outcome.detail.to_owned(),
            message: outcome.message,
            duration_ms: outcome.duration_ms,
        }
    }
}

impl From<&BatchSummary> for Row {
    fn from(summary: &BatchSummary) -> Self {
        let counts = summary.counts;
        Self {
            operation: summary.operation.as_str(),
            index: None,
            pull_request: None,
            node_id: None,
            status: "summary",
            detail: format!(
                "{} of {} succeeded ({} no-op), {} failed, {} skipped",
                counts.succeeded, summary.total, counts.noop, counts.failed, counts.skipped
            ),
            message: summary.cancelled.then(|| "cancelled".to_owned()),
            duration_ms: millis(summary.elapsed),
        }
    }
}

/// Writes a batch summary in CSV format to the given writer.
///
/// # Errors
///
/// Returns [`AppError::Io`] if writing to the output fails, or if CSV
/// serialization fails.
pub fn write_summary_csv<W: Write>(writer: &mut W, summary: &BatchSummary) -> Result<(), AppError> {
    write_rows(writer, &[summary])
}

/// Writes the fetch phase and, when it ran, the mutation phase of a plan
/// under one header.
///
/// # Errors
///
/// Returns [`AppError::Io`] if writing to the output fails, or if CSV
/// serialization fails.
pub fn write_plan_csv<W: Write>(writer: &mut W, outcome: &PlanOutcome) -> Result<(), AppError> {
    let mut summaries = vec![&outcome.fetch];
    summaries.extend(outcome.mutation.as_ref());
    write_rows(writer, &summaries)
}

fn write_rows<W: Write>(writer: &mut W, summaries: &[&BatchSummary]) -> Result<(), AppError> {
    let mut rows = WriterBuilder::new().has_headers(false).from_writer(writer);
    rows.write_record(HEADER).map_err(|e| csv_error(&e))?;
    for summary in summaries {
        for report in &summary.reports {
            rows.serialize(Row::from(ExportedOutcome::from(report)))
                .map_err(|e| csv_error(&e))?;
        }
        rows.serialize(Row::from(*summary))
            .map_err(|e| csv_error(&e))?;
    }
    rows.flush()?;
    Ok(())
}

fn csv_error(error: &csv::Error) -> AppError {
    AppError::Io {
        message: format!("CSV serialization failed: {error}"),
    }
}

#[cfg(test)]
#[path = "delimited_tests.rs"]
mod tests;
