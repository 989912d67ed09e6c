//! prsweep library crate: batch operations on GitHub pull request review
//! threads.
//!
//! The library fetches review threads over the GitHub GraphQL API, plans
//! mutations such as resolving outdated threads or applying suggestions, and
//! runs them through a bounded, rate-governed and cancellable batch engine
//! that reports exactly one outcome per target.

pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod github;
pub mod plan;
pub mod telemetry;

pub use batch::{BatchConfig, BatchExecutor, BatchSummary, OperationOutcome, Target};
pub use config::PrsweepConfig;
pub use error::AppError;
pub use export::ExportFormat;
pub use filter::ThreadFilter;
pub use github::{
    GatewayError, GraphqlTransport, OctocrabTransport, PersonalAccessToken, PullRequestLocator,
};
pub use plan::{BatchOperation, ListedThread, PlanOutcome, Planner};
pub use telemetry::{NoopTelemetrySink, StderrJsonlTelemetrySink, TelemetryEvent, TelemetrySink};
