//! Markdown formatter for batch summaries.
//!
//! Renders a header with totals, a table with one row per target and an
//! errors section listing every failure message. Reports also list the
//! threads passing the selected filter.

use std::io::Write;

use crate::batch::{BatchSummary, OperationOutcome, SuccessDetail, TargetReport};
use crate::error::AppError;
use crate::github::models::ReviewThread;
use crate::plan::{BatchOperation, ListedThread, PlanOutcome};

use super::model::millis;

/// Writes a plan outcome in Markdown format to the given writer.
///
/// The fetch phase is always rendered. The mutation phase follows when it
/// ran; otherwise a note states the planned count was not applied.
///
/// # Errors
///
/// Returns [`AppError::Io`] if writing to the output fails.
pub fn write_plan_markdown<W: Write>(
    writer: &mut W,
    outcome: &PlanOutcome,
) -> Result<(), AppError> {
    writeln!(writer, "# prsweep: {}", outcome.operation)?;
    writeln!(writer)?;
    write_summary_section(writer, &outcome.fetch, "##")?;

    match &outcome.mutation {
        Some(mutation) => write_summary_section(writer, mutation, "##")?,
        None if outcome.operation.mutation_kind().is_some() => {
            writeln!(
                writer,
                "Planned {} mutation(s); none were applied.",
                outcome.planned.len()
            )?;
            writeln!(writer)?;
        }
        None => {}
    }
    if outcome.operation == BatchOperation::Report {
        write_threads(writer, outcome)?;
    }
    Ok(())
}

/// Writes a single batch summary in Markdown format.
///
/// # Errors
///
/// Returns [`AppError::Io`] if writing to the output fails.
pub fn write_summary_markdown<W: Write>(
    writer: &mut W,
    summary: &BatchSummary,
) -> Result<(), AppError> {
    write_summary_section(writer, summary, "#")
}

fn write_summary_section<W: Write>(
    writer: &mut W,
    summary: &BatchSummary,
    heading: &str,
) -> Result<(), AppError> {
    writeln!(writer, "{heading} Batch summary: {}", summary.operation)?;
    writeln!(writer)?;
    write_totals(writer, summary)?;
    if !summary.reports.is_empty() {
        write_table(writer, &summary.reports)?;
    }
    write_errors(writer, summary, heading)?;
    Ok(())
}

fn write_totals<W: Write>(writer: &mut W, summary: &BatchSummary) -> Result<(), AppError> {
    let counts = summary.counts;
    writeln!(writer, "- Total: {}", summary.total)?;
    writeln!(
        writer,
        "- Succeeded: {} ({} no-op)",
        counts.succeeded, counts.noop
    )?;
    writeln!(
        writer,
        "- Failed: {} (transport {}, forbidden {}, unknown {})",
        counts.failed, counts.transport_failures, counts.forbidden, counts.unknown_failures
    )?;
    writeln!(writer, "- Skipped: {}", counts.skipped)?;
    match summary.success_rate_percent() {
        Some(rate) => writeln!(writer, "- Success rate: {rate}%")?,
        None => writeln!(writer, "- Success rate: n/a")?,
    }
    writeln!(writer, "- Duration: {} ms", millis(summary.elapsed))?;
    if summary.cancelled {
        writeln!(writer, "- Cancelled: yes")?;
    }
    writeln!(writer)?;
    Ok(())
}

fn write_table<W: Write>(writer: &mut W, reports: &[TargetReport]) -> Result<(), AppError> {
    writeln!(writer, "| # | Pull request | Node | Status | Detail | Duration |")?;
    writeln!(writer, "|---|---|---|---|---|---|")?;
    for report in reports {
        writeln!(
            writer,
            "| {} | {} | {} | {} | {} | {} ms |",
            report.index + 1,
            report.target.pull_request(),
            report.target.payload().node_id().unwrap_or("-"),
            report.outcome.status(),
            table_cell(&detail(&report.outcome)),
            millis(report.duration),
        )?;
    }
    writeln!(writer)?;
    Ok(())
}

fn write_errors<W: Write>(
    writer: &mut W,
    summary: &BatchSummary,
    heading: &str,
) -> Result<(), AppError> {
    let mut failures = summary.failures().peekable();
    if failures.peek().is_none() {
        return Ok(());
    }
    writeln!(writer, "{heading}# Errors")?;
    writeln!(writer)?;
    for report in failures {
        writeln!(
            writer,
            "- `{}`: {}",
            report.target,
            single_line(&report.outcome.to_string())
        )?;
    }
    writeln!(writer)?;
    Ok(())
}

fn write_threads<W: Write>(writer: &mut W, outcome: &PlanOutcome) -> Result<(), AppError> {
    writeln!(writer, "## Threads ({})", outcome.filter)?;
    writeln!(writer)?;
    if outcome.listed.is_empty() {
        writeln!(writer, "No threads match the `{}` filter.", outcome.filter)?;
        writeln!(writer)?;
        return Ok(());
    }
    writeln!(
        writer,
        "| Pull request | Thread | Location | State | Comments | Suggestions |"
    )?;
    writeln!(writer, "|---|---|---|---|---|---|")?;
    for ListedThread {
        pull_request,
        thread,
    } in &outcome.listed
    {
        writeln!(
            writer,
            "| {pull_request} | {} | {} | {} | {} | {} |",
            thread.id,
            table_cell(&location(thread)),
            thread_state(thread),
            thread.comments.len(),
            thread.suggestion_ids().len(),
        )?;
    }
    writeln!(writer)?;
    Ok(())
}

fn location(thread: &ReviewThread) -> String {
    match (thread.path.as_deref(), thread.line) {
        (Some(path), Some(line)) => format!("{path}:{line}"),
        (Some(path), None) => path.to_owned(),
        (None, _) => "-".to_owned(),
    }
}

const fn thread_state(thread: &ReviewThread) -> &'static str {
    match (thread.is_resolved, thread.is_outdated) {
        (false, false) => "unresolved",
        (false, true) => "unresolved, outdated",
        (true, false) => "resolved",
        (true, true) => "resolved, outdated",
    }
}

/// Short description of an outcome for the table's detail column.
fn detail(outcome: &OperationOutcome) -> String {
    match outcome {
        OperationOutcome::Succeeded(SuccessDetail::Threads(threads)) => format!(
            "{} threads, {} outdated open, {} suggestions",
            threads.counts.total(),
            threads.counts.unresolved_outdated,
            threads.counts.suggestions
        ),
        OperationOutcome::Succeeded(success) => success.label().to_owned(),
        OperationOutcome::Failed { kind, .. } => kind.as_str().to_owned(),
        OperationOutcome::Skipped(reason) => reason.as_str().to_owned(),
    }
}

/// Joins the lines of `text` with spaces so it fits one list item.
fn single_line(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(" ")
}

/// Escapes characters that would break a Markdown table row.
fn table_cell(text: &str) -> String {
    single_line(text).replace('|', "\\|")
}

#[cfg(test)]
#[path = "markdown_tests.rs"]
mod tests;
