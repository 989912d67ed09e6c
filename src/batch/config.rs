//! Runtime limits for a batch run.

use std::time::Duration;

use super::error::BatchError;
use super::governor::GovernorLimits;

/// Default number of workers.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default ceiling on simultaneously outstanding remote calls.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 5;

/// Default timeout applied to each remote call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default rate window.
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(1);

/// Limits applied to one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of worker tasks pulling from the queue.
    pub concurrency: usize,
    /// Maximum remote calls outstanding at once, across all workers.
    pub max_in_flight: usize,
    /// Maximum call starts per `window`; `None` disables the rate ceiling.
    pub max_per_window: Option<u32>,
    /// Sliding window the rate ceiling is measured over.
    pub window: Duration,
    /// Timeout applied to every remote call.
    pub call_timeout: Duration,
    /// Wall-clock budget for the whole run; `None` means unbounded.
    pub deadline: Option<Duration>,
    /// Extra attempts for retryable read failures. Mutations never retry.
    pub read_retries: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            max_per_window: None,
            window: DEFAULT_RATE_WINDOW,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            deadline: None,
            read_retries: 0,
        }
    }
}

impl BatchConfig {
    /// Checks every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns the first [`BatchError`] describing an unusable limit.
    pub const fn validate(&self) -> Result<(), BatchError> {
        if self.concurrency == 0 {
            return Err(BatchError::InvalidConcurrency {
                value: self.concurrency,
            });
        }
        if self.max_in_flight == 0 {
            return Err(BatchError::InvalidInFlightLimit {
                value: self.max_in_flight,
            });
        }
        if let Some(value) = self.max_per_window
            && value == 0
        {
            return Err(BatchError::InvalidRateLimit { value });
        }
        if self.window.is_zero() {
            return Err(BatchError::InvalidWindow);
        }
        if self.call_timeout.is_zero() {
            return Err(BatchError::InvalidTimeout);
        }
        Ok(())
    }

    /// Limits handed to the rate governor.
    #[must_use]
    pub const fn governor_limits(&self) -> GovernorLimits {
        GovernorLimits {
            max_in_flight: self.max_in_flight,
            max_per_window: self.max_per_window,
            window: self.window,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::BatchConfig;
    use crate::batch::error::BatchError;

    #[rstest]
    fn default_config_is_valid() {
        assert_eq!(BatchConfig::default().validate(), Ok(()));
    }

    #[rstest]
    #[case::zero_workers(
        BatchConfig { concurrency: 0, ..BatchConfig::default() },
        BatchError::InvalidConcurrency { value: 0 }
    )]
    #[case::zero_in_flight(
        BatchConfig { max_in_flight: 0, ..BatchConfig::default() },
        BatchError::InvalidInFlightLimit { value: 0 }
    )]
    #[case::zero_rate(
        BatchConfig { max_per_window: Some(0), ..BatchConfig::default() },
        BatchError::InvalidRateLimit { value: 0 }
    )]
    #[case::zero_window(
        BatchConfig { window: Duration::ZERO, ..BatchConfig::default() },
        BatchError::InvalidWindow
    )]
    #[case::zero_timeout(
        BatchConfig { call_timeout: Duration::ZERO, ..BatchConfig::default() },
        BatchError::InvalidTimeout
    )]
    fn validate_rejects_unusable_limits(#[case] config: BatchConfig, #[case] expected: BatchError) {
        assert_eq!(config.validate(), Err(expected));
    }

    #[rstest]
    fn governor_limits_mirror_config() {
        let config = BatchConfig {
            max_in_flight: 3,
            max_per_window: Some(10),
            window: Duration::from_millis(500),
            ..BatchConfig::default()
        };
        let limits = config.governor_limits();

        assert_eq!(limits.max_in_flight, 3);
        assert_eq!(limits.max_per_window, Some(10));
        assert_eq!(limits.window, Duration::from_millis(500));
    }
}
