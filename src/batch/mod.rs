//! Batch mutation engine.
//!
//! Executes one operation across many [`Target`]s with bounded concurrency,
//! a shared rate ceiling and cooperative cancellation. Every submitted target
//! ends with exactly one [`OperationOutcome`] in the returned
//! [`BatchSummary`], listed in submission order.
//!
//! Components, leaves first: [`MutationClient`] issues a single remote call,
//! [`RateGovernor`] gates calls, [`BatchExecutor`] runs the worker pool,
//! [`ResultAggregator`] collects outcomes and [`ProgressReporter`] observes
//! the run.

pub mod aggregator;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod governor;
pub mod outcome;
pub mod progress;
pub mod target;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use aggregator::{BatchSummary, OutcomeCounts, ResultAggregator, TargetReport};
pub use client::MutationClient;
pub use config::BatchConfig;
pub use error::BatchError;
pub use executor::BatchExecutor;
pub use governor::{GovernorLimits, GovernorTicket, RateGovernor};
pub use outcome::{FailureKind, OperationOutcome, SkipReason, SuccessDetail};
pub use progress::{NoopProgress, ProgressReporter, StderrLineProgress, TracingProgress};
pub use target::{OperationKind, Target, TargetPayload};
