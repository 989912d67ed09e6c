//! Octocrab implementation of the GraphQL transport.

use async_trait::async_trait;
use octocrab::Octocrab;
use url::Url;

use crate::github::error::GatewayError;
use crate::github::locator::PersonalAccessToken;

use super::client::build_octocrab_client;
use super::error_mapping::map_octocrab_error;
use super::{GraphqlRequest, GraphqlTransport};

/// Octocrab-backed GraphQL transport.
///
/// The wrapped client is read-only after construction and safe to share
/// across concurrent batch workers.
pub struct OctocrabTransport {
    client: Octocrab,
}

impl OctocrabTransport {
    /// Wraps an existing Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds an authenticated transport for the given API base.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidUrl` when the base URI cannot be parsed or
    /// `GatewayError::Api` when Octocrab fails to construct a client.
    pub fn for_token(token: &PersonalAccessToken, api_base: &Url) -> Result<Self, GatewayError> {
        let client = build_octocrab_client(token, api_base.as_str())?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl GraphqlTransport for OctocrabTransport {
    async fn execute(&self, request: &GraphqlRequest) -> Result<serde_json::Value, GatewayError> {
        tracing::trace!(operation = request.operation_name, "sending GraphQL request");
        self.client
            .graphql::<serde_json::Value>(request)
            .await
            .map_err(|error| map_octocrab_error(request.operation_name, &error))
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
