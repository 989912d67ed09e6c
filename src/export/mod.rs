//! Structured summary export.
//!
//! Renders [`BatchSummary`](crate::batch::BatchSummary) and
//! [`PlanOutcome`](crate::plan::PlanOutcome) values for people (Markdown),
//! pipelines (JSONL) or spreadsheets (CSV).
//!
//! # Ordering
//!
//! Targets are always written in submission order, whatever order they
//! completed in.

mod delimited;
mod jsonl;
mod markdown;
mod model;
#[cfg(test)]
mod test_helpers;

use std::io::Write;

use crate::error::AppError;
use crate::plan::PlanOutcome;

pub use delimited::{write_plan_csv, write_summary_csv};
pub use jsonl::{write_plan_jsonl, write_summary_jsonl};
pub use markdown::{write_plan_markdown, write_summary_markdown};
pub use model::{
    ExportFormat, ExportRecord, ExportedOutcome, ExportedPlan, ExportedSummary, ExportedThread,
};

/// Writes `outcome` in the selected `format`.
///
/// # Errors
///
/// Returns [`AppError::Io`] if writing or serialization fails.
pub fn write_plan<W: Write>(
    writer: &mut W,
    outcome: &PlanOutcome,
    format: ExportFormat,
) -> Result<(), AppError> {
    match format {
        ExportFormat::Markdown => write_plan_markdown(writer, outcome),
        ExportFormat::Jsonl => write_plan_jsonl(writer, outcome),
        ExportFormat::Csv => write_plan_csv(writer, outcome),
    }
}
