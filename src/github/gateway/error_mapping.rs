//! Maps Octocrab failures into [`GatewayError`] variants.

use http::StatusCode;

use crate::github::error::GatewayError;

/// Checks if an octocrab error represents a network/transport issue.
const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

const fn is_decode_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Serde { .. } | octocrab::Error::Json { .. }
    )
}

/// Checks whether the GitHub error represents a rate limit error based on the
/// HTTP status and message / documentation URL content.
fn is_rate_limit_error(source: &octocrab::GitHubError) -> bool {
    let is_rate_limit_status = matches!(
        source.status_code,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    );

    let message_indicates_rate_limit = source.message.to_lowercase().contains("rate limit")
        || source
            .documentation_url
            .as_deref()
            .is_some_and(|url| url.contains("rate-limit"));

    is_rate_limit_status && message_indicates_rate_limit
}

fn map_github_status(operation: &str, source: &octocrab::GitHubError) -> GatewayError {
    let status = source.status_code;
    let message = format!(
        "{operation} failed: GitHub returned {status} {detail}",
        detail = source.message
    );

    if is_rate_limit_error(source) {
        return GatewayError::RateLimitExceeded { message };
    }

    match status {
        StatusCode::UNAUTHORIZED => GatewayError::Authentication { message },
        StatusCode::FORBIDDEN => GatewayError::Forbidden { message },
        server if server.is_server_error() => GatewayError::Server {
            status: server.as_u16(),
            message,
        },
        _ => GatewayError::Api { message },
    }
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> GatewayError {
    if let octocrab::Error::GitHub { source, .. } = error {
        return map_github_status(operation, source);
    }

    if is_network_error(error) {
        return GatewayError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    if is_decode_error(error) {
        return GatewayError::Decode {
            message: format!("{operation} failed: {error}"),
        };
    }

    GatewayError::Api {
        message: format!("{operation} failed: {error}"),
    }
}
