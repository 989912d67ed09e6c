//! Top-level error type for the `prsweep` binary and library entry points.

use thiserror::Error;

use crate::batch::BatchError;
use crate::github::GatewayError;

/// Errors that stop a `prsweep` invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    /// Parsing input or talking to GitHub failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The batch engine refused to run.
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// Configuration could not be loaded or is incomplete.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// Writing output failed.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O failure.
        message: String,
    },
}

impl AppError {
    /// Builds a [`AppError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}
