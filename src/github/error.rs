//! Error types exposed by the GitHub layer.

use thiserror::Error;

/// Errors surfaced while parsing input or communicating with GitHub.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The provided URL could not be parsed.
    #[error("pull request URL is invalid: {0}")]
    InvalidUrl(String),

    /// The pull request path is incomplete.
    #[error("pull request URL must match /owner/repo/pull/<number>")]
    MissingPathSegments,

    /// The pull request number is not a valid integer.
    #[error("pull request number must be a positive integer")]
    InvalidPullRequestNumber,

    /// The authentication token was missing.
    #[error("personal access token is required")]
    MissingToken,

    /// A GraphQL node identifier was empty or contained foreign characters.
    #[error("invalid GitHub node id: {value:?}")]
    InvalidNodeId {
        /// The rejected identifier.
        value: String,
    },

    /// The authentication token was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// GitHub error message returned with the 401 response.
        message: String,
    },

    /// The token is valid but lacks permission for the request.
    #[error("GitHub denied access: {message}")]
    Forbidden {
        /// GitHub error message returned with the 403 response.
        message: String,
    },

    /// GitHub throttled the request (primary or secondary rate limit).
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Error message from GitHub.
        message: String,
    },

    /// GitHub returned a server-side failure.
    #[error("GitHub server error {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response detail.
        message: String,
    },

    /// GitHub returned any other API error.
    #[error("GitHub API error: {message}")]
    Api {
        /// Response body from GitHub describing the failure.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("unexpected response from GitHub: {message}")]
    Decode {
        /// Decoder error detail.
        message: String,
    },
}
