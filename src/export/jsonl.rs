//! JSONL (JSON Lines) formatter for batch summaries.
//!
//! Writes one `outcome` record per target in submission order followed by a
//! `summary` record for the run, so consumers can stream results. Reports
//! add one `thread` record per listed thread before the closing `plan`.

use std::io::Write;

use crate::batch::BatchSummary;
use crate::error::AppError;
use crate::plan::PlanOutcome;

use super::model::{
    ExportRecord, ExportedOutcome, ExportedPlan, ExportedSummary, ExportedThread,
};

/// Writes a batch summary in JSONL format to the given writer.
///
/// # Errors
///
/// Returns [`AppError::Io`] if writing to the output fails, or if
/// JSON serialization fails.
pub fn write_summary_jsonl<W: Write>(
    writer: &mut W,
    summary: &BatchSummary,
) -> Result<(), AppError> {
    for report in &summary.reports {
        write_record(writer, &ExportRecord::Outcome(ExportedOutcome::from(report)))?;
    }
    write_record(writer, &ExportRecord::Summary(ExportedSummary::from(summary)))
}

/// Writes both phases of a plan outcome in JSONL format, ending with a
/// `plan` record.
///
/// # Errors
///
/// Returns [`AppError::Io`] if writing to the output fails, or if
/// JSON serialization fails.
pub fn write_plan_jsonl<W: Write>(writer: &mut W, outcome: &PlanOutcome) -> Result<(), AppError> {
    write_summary_jsonl(writer, &outcome.fetch)?;
    if let Some(mutation) = &outcome.mutation {
        write_summary_jsonl(writer, mutation)?;
    }
    for listed in &outcome.listed {
        write_record(writer, &ExportRecord::Thread(ExportedThread::from(listed)))?;
    }
    write_record(writer, &ExportRecord::Plan(ExportedPlan::from(outcome)))
}

fn write_record<W: Write>(writer: &mut W, record: &ExportRecord) -> Result<(), AppError> {
    serde_json::to_writer(&mut *writer, record).map_err(|e| AppError::Io {
        message: format!("JSON serialization failed: {e}"),
    })?;
    writeln!(writer)?;
    Ok(())
}
