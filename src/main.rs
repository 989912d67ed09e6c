//! prsweep CLI entrypoint for batch review thread operations.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use ortho_config::OrthoConfig;
use prsweep::batch::{ProgressReporter, StderrLineProgress, TracingProgress};
use prsweep::export::write_plan;
use prsweep::{
    AppError, BatchExecutor, ExportFormat, OctocrabTransport, PersonalAccessToken, PlanOutcome,
    Planner, PrsweepConfig, StderrJsonlTelemetrySink, TelemetryEvent, TelemetrySink,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "PRSWEEP_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    match run().await {
        Ok(outcome) if outcome.has_failures() => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run() -> Result<PlanOutcome, AppError> {
    let config = load_config()?;

    let pull_requests = config.pull_requests()?;
    let token = PersonalAccessToken::new(config.resolve_token()?)?;
    let operation = config.batch_operation()?;
    let format = config.export_format()?;
    let filter = config.thread_filter()?;
    let batch_config = config.batch_config()?;

    let api_base = pull_requests
        .first()
        .map(|locator| locator.api_base().clone())
        .ok_or_else(|| AppError::configuration("no pull requests to process"))?;
    let transport = OctocrabTransport::for_token(&token, &api_base)?;
    let planner = Planner::new(BatchExecutor::new(transport, batch_config)).with_filter(filter);

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let progress = progress_for(format);
    let outcome = if config.dry_run {
        planner
            .preview(pull_requests, operation, progress, &cancel)
            .await?
    } else {
        planner.run(pull_requests, operation, progress, &cancel).await?
    };

    record_telemetry(&StderrJsonlTelemetrySink, &outcome);
    write_plan(&mut io::stdout().lock(), &outcome, format)?;
    Ok(outcome)
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`AppError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<PrsweepConfig, AppError> {
    PrsweepConfig::load().map_err(|error| AppError::configuration(error.to_string()))
}

/// Cancels `cancel` on the first Ctrl-C.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("interrupt received, cancelling remaining targets");
                cancel.cancel();
            }
            Err(error) => tracing::warn!("failed to listen for interrupt: {error}"),
        }
    });
}

/// Human output gets line progress on stderr; machine output stays quiet
/// apart from tracing.
fn progress_for(format: ExportFormat) -> Arc<dyn ProgressReporter> {
    match format {
        ExportFormat::Markdown => Arc::new(StderrLineProgress),
        ExportFormat::Jsonl | ExportFormat::Csv => Arc::new(TracingProgress),
    }
}

fn record_telemetry(sink: &dyn TelemetrySink, outcome: &PlanOutcome) {
    sink.record(TelemetryEvent::batch_completed(&outcome.fetch));
    if let Some(mutation) = &outcome.mutation {
        sink.record(TelemetryEvent::batch_completed(mutation));
    }
}
