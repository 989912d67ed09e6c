//! Application configuration loaded from CLI, environment, and files.
//!
//! This module provides a unified configuration struct that merges values
//! from command-line arguments, environment variables, and configuration
//! files using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.prsweep.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `PRSWEEP_PR_URLS`, `PRSWEEP_TOKEN`, or
//!    `GITHUB_TOKEN`
//! 4. **Command-line arguments** – `--pr-urls`/`-u`, `--token`/`-t`, ...
//!
//! # Configuration File
//!
//! ```toml
//! pr_urls = "https://github.com/owner/repo/pull/1,https://github.com/owner/repo/pull/2"
//! operation = "resolve-outdated"
//! concurrency = 8
//! rate_limit_per_second = 10
//! format = "jsonl"
//! filter = "unresolved"
//! ```

use std::env;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::batch::BatchConfig;
use crate::batch::config::{
    DEFAULT_CALL_TIMEOUT, DEFAULT_CONCURRENCY, DEFAULT_MAX_IN_FLIGHT, DEFAULT_RATE_WINDOW,
};
use crate::error::AppError;
use crate::export::ExportFormat;
use crate::filter::ThreadFilter;
use crate::github::GatewayError;
use crate::github::locator::PullRequestLocator;
use crate::plan::BatchOperation;

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use ortho_config::OrthoConfig;
/// use prsweep::PrsweepConfig;
///
/// let config = PrsweepConfig::load().expect("failed to load configuration");
/// let pull_requests = config.pull_requests().expect("PR URLs required");
/// let batch = config.batch_config().expect("valid limits");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "PRSWEEP",
    discovery(
        dotfile_name = ".prsweep.toml",
        config_file_name = "prsweep.toml",
        app_name = "prsweep"
    )
)]
pub struct PrsweepConfig {
    /// Comma-separated pull request URLs to operate on.
    ///
    /// Can be provided via:
    /// - CLI: `--pr-urls <URLS>` or `-u <URLS>`
    /// - Environment: `PRSWEEP_PR_URLS`
    /// - Config file: `pr_urls = "..."`
    #[ortho_config(cli_short = 'u')]
    pub pr_urls: Option<String>,

    /// Personal access token for GitHub API authentication.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `PRSWEEP_TOKEN` or `GITHUB_TOKEN`
    /// - Config file: `token = "..."`
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Operation to apply: `resolve-outdated`, `accept-suggestions` or
    /// `report` (the default).
    #[ortho_config(cli_short = 'o')]
    pub operation: Option<String>,

    /// Number of worker tasks.
    #[ortho_config(cli_short = 'c')]
    pub concurrency: usize,

    /// Maximum remote calls outstanding at once.
    #[ortho_config()]
    pub max_in_flight: usize,

    /// Maximum call starts per second; `0` disables the ceiling.
    #[ortho_config(cli_short = 'r')]
    pub rate_limit_per_second: u32,

    /// Timeout for each remote call, in seconds.
    #[ortho_config()]
    pub call_timeout_seconds: u64,

    /// Wall-clock budget for each batch run in seconds; `0` means none.
    #[ortho_config()]
    pub deadline_seconds: u64,

    /// Extra attempts for retryable thread fetch failures.
    #[ortho_config()]
    pub read_retries: u32,

    /// Output format: `markdown` (the default), `jsonl` or `csv`.
    #[ortho_config(cli_short = 'f')]
    pub format: Option<String>,

    /// Threads listed by the `report` operation: `all` (the default),
    /// `unresolved`, `resolved-active`, `unresolved-outdated` or
    /// `current-unresolved`.
    #[ortho_config()]
    pub filter: Option<String>,

    /// Fetches and plans without applying any mutation.
    ///
    /// Can be provided via:
    /// - CLI: `--dry-run` / `-n`
    /// - Config file: `dry_run = true`
    ///
    /// Note: `PRSWEEP_DRY_RUN` is not supported because `ortho_config` does
    /// not load boolean values from the environment.
    #[ortho_config(cli_short = 'n')]
    pub dry_run: bool,
}

impl Default for PrsweepConfig {
    fn default() -> Self {
        Self {
            pr_urls: None,
            token: None,
            operation: None,
            concurrency: DEFAULT_CONCURRENCY,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            rate_limit_per_second: 0,
            call_timeout_seconds: DEFAULT_CALL_TIMEOUT.as_secs(),
            deadline_seconds: 0,
            read_retries: 0,
            format: None,
            filter: None,
            dry_run: false,
        }
    }
}

impl PrsweepConfig {
    /// Resolves the token from configuration or the `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Gateway`] wrapping [`GatewayError::MissingToken`]
    /// when no token source provides a value.
    pub fn resolve_token(&self) -> Result<String, AppError> {
        self.token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .ok_or(AppError::Gateway(GatewayError::MissingToken))
    }

    /// Returns the configured pull request URLs, trimmed, in order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] when no URL is configured.
    pub fn require_pr_urls(&self) -> Result<Vec<&str>, AppError> {
        let urls: Vec<&str> = self
            .pr_urls
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .collect();
        if urls.is_empty() {
            return Err(AppError::configuration(
                "at least one pull request URL is required (use --pr-urls or -u)",
            ));
        }
        Ok(urls)
    }

    /// Parses every configured URL into a locator.
    ///
    /// All pull requests must live on the same GitHub host because one
    /// client serves the whole run.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] when no URL is configured or the
    /// URLs span several hosts, and [`AppError::Gateway`] when a URL does not
    /// parse.
    pub fn pull_requests(&self) -> Result<Vec<PullRequestLocator>, AppError> {
        let locators = self
            .require_pr_urls()?
            .into_iter()
            .map(PullRequestLocator::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(first) = locators.first()
            && let Some(other) = locators
                .iter()
                .find(|locator| locator.api_base() != first.api_base())
        {
            return Err(AppError::configuration(format!(
                "all pull requests must be on one GitHub host: {} and {} differ",
                first.api_base(),
                other.api_base()
            )));
        }
        Ok(locators)
    }

    /// Parses the configured operation, defaulting to `report`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] for an unknown operation name.
    pub fn batch_operation(&self) -> Result<BatchOperation, AppError> {
        self.operation
            .as_deref()
            .map(str::parse)
            .transpose()
            .map(Option::unwrap_or_default)
    }

    /// Parses the configured output format, defaulting to Markdown.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] for an unknown format name.
    pub fn export_format(&self) -> Result<ExportFormat, AppError> {
        self.format
            .as_deref()
            .map(str::parse)
            .transpose()
            .map(Option::unwrap_or_default)
    }

    /// Parses the configured thread filter, defaulting to every thread.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] for an unknown filter name.
    pub fn thread_filter(&self) -> Result<ThreadFilter, AppError> {
        self.filter
            .as_deref()
            .map(str::parse)
            .transpose()
            .map(Option::unwrap_or_default)
    }

    /// Builds validated engine limits from the configured values.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Batch`] when a limit is unusable, such as zero
    /// workers or a zero call timeout.
    pub fn batch_config(&self) -> Result<BatchConfig, AppError> {
        let config = BatchConfig {
            concurrency: self.concurrency,
            max_in_flight: self.max_in_flight,
            max_per_window: (self.rate_limit_per_second > 0).then_some(self.rate_limit_per_second),
            window: DEFAULT_RATE_WINDOW,
            call_timeout: Duration::from_secs(self.call_timeout_seconds),
            deadline: (self.deadline_seconds > 0)
                .then(|| Duration::from_secs(self.deadline_seconds)),
            read_retries: self.read_retries,
        };
        config.validate()?;
        Ok(config)
    }
}
