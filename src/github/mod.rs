//! GitHub pull request addressing, review thread models and transport.
//!
//! This module parses pull request URLs, validates tokens and node ids, and
//! wraps Octocrab behind a narrow GraphQL transport trait. Errors are mapped
//! into [`GatewayError`] so callers never see Octocrab internals.

pub mod error;
pub mod gateway;
pub mod ids;
pub mod locator;
pub mod models;

pub use error::GatewayError;
pub use gateway::{GraphqlRequest, GraphqlTransport, OctocrabTransport};
pub use ids::{SuggestionId, ThreadId};
pub use locator::{
    PersonalAccessToken, PullRequestLocator, PullRequestNumber, RepositoryName, RepositoryOwner,
};
pub use models::{ReviewThread, ThreadComment, ThreadCounts, ThreadReport};

#[cfg(test)]
pub use gateway::MockGraphqlTransport;

#[cfg(test)]
mod tests;
