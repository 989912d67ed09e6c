//! Authenticated GraphQL transport for GitHub.
//!
//! The [`GraphqlTransport`] trait is the narrow seam the batch engine talks
//! through: one request in, one JSON body (or a typed transport error) out.
//! The Octocrab implementation handles real HTTP; tests substitute mocks.

mod client;
pub(crate) mod documents;
mod error_mapping;
mod transport;

pub use transport::OctocrabTransport;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::github::error::GatewayError;

/// A single GraphQL query or mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    /// Operation name declared in `query`.
    pub operation_name: &'static str,
    /// GraphQL document.
    pub query: &'static str,
    /// Variables bound to the document.
    pub variables: serde_json::Value,
}

/// Transport able to issue one GraphQL request against GitHub.
///
/// Implementations must be stateless per call apart from the authenticated
/// client they wrap.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    /// Sends the request and returns the raw response body.
    ///
    /// GraphQL-level errors arrive inside the body; only HTTP and network
    /// failures are returned as `Err`.
    async fn execute(&self, request: &GraphqlRequest) -> Result<serde_json::Value, GatewayError>;
}

#[async_trait]
impl<T: GraphqlTransport + ?Sized> GraphqlTransport for Arc<T> {
    async fn execute(&self, request: &GraphqlRequest) -> Result<serde_json::Value, GatewayError> {
        (**self).execute(request).await
    }
}
