//! Hard failures raised by the batch engine.
//!
//! Per-target problems never appear here; they are captured as
//! [`OperationOutcome::Failed`](super::OperationOutcome::Failed) inside the
//! summary. Only pre-flight configuration errors and internal consistency
//! violations abort a run.

use thiserror::Error;

use super::target::OperationKind;

/// Errors that abort a batch run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BatchError {
    /// Worker concurrency must be at least one.
    #[error("concurrency must be at least 1, got {value}")]
    InvalidConcurrency {
        /// Rejected value.
        value: usize,
    },

    /// The in-flight ceiling must be at least one.
    #[error("in-flight limit must be at least 1, got {value}")]
    InvalidInFlightLimit {
        /// Rejected value.
        value: usize,
    },

    /// A rate ceiling, when set, must allow at least one operation.
    #[error("rate limit must allow at least 1 operation per window, got {value}")]
    InvalidRateLimit {
        /// Rejected value.
        value: u32,
    },

    /// The rate window must be non-zero.
    #[error("rate window must be longer than zero")]
    InvalidWindow,

    /// The per-call timeout must be non-zero.
    #[error("per-call timeout must be longer than zero")]
    InvalidTimeout,

    /// A target does not match the operation requested for the run.
    #[error("target {index} is a {found} operation but the run is {expected}")]
    OperationMismatch {
        /// Submission index of the offending target.
        index: usize,
        /// Operation requested for the run.
        expected: OperationKind,
        /// Operation carried by the target.
        found: OperationKind,
    },

    /// An outcome was recorded twice for the same submission index.
    #[error("internal error: outcome for target {index} recorded twice")]
    DuplicateOutcome {
        /// Submission index recorded twice.
        index: usize,
    },

    /// An outcome referenced a submission index outside the run.
    #[error("internal error: no target at index {index}")]
    UnknownTargetIndex {
        /// The out-of-range index.
        index: usize,
    },
}
