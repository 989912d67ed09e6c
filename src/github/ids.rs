//! GraphQL node identifiers for review threads and suggestions.
//!
//! GitHub node ids are opaque base64-like strings. They are validated once at
//! construction so the mutation client can trust every payload it receives.

use std::fmt;

use super::error::GatewayError;

fn validate_node_id(value: &str) -> Result<String, GatewayError> {
    let is_node_char =
        |character: char| character.is_ascii_alphanumeric() || "+/=_-".contains(character);

    if value.is_empty() || !value.chars().all(is_node_char) {
        return Err(GatewayError::InvalidNodeId {
            value: value.to_owned(),
        });
    }
    Ok(value.to_owned())
}

/// Node id of a pull request review thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(String);

impl ThreadId {
    /// Validates and wraps a review thread node id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidNodeId`] for empty ids or ids containing
    /// characters outside the URL-safe base64 alphabet.
    pub fn new(value: &str) -> Result<Self, GatewayError> {
        validate_node_id(value).map(Self)
    }

    /// Borrow the raw id.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Node id of a review comment carrying a suggested change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuggestionId(String);

impl SuggestionId {
    /// Validates and wraps a suggestion comment node id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidNodeId`] for empty ids or ids containing
    /// characters outside the URL-safe base64 alphabet.
    pub fn new(value: &str) -> Result<Self, GatewayError> {
        validate_node_id(value).map(Self)
    }

    /// Borrow the raw id.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SuggestionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{GatewayError, SuggestionId, ThreadId};

    #[rstest]
    #[case::plain("PRRT_kwDOABCD1234")]
    #[case::padded("MDEyOlB1bGxSZXF1ZXN0UmV2aWV3VGhyZWFk==")]
    #[case::url_safe("PRRC_kw-DO_ab/cd+ef")]
    fn accepts_node_ids(#[case] raw: &str) {
        let id = ThreadId::new(raw).expect("node id should be accepted");
        assert_eq!(id.as_str(), raw);
    }

    #[rstest]
    #[case::empty("")]
    #[case::space("PRRT abc")]
    #[case::injection("abc\"){ viewer { login } }")]
    fn rejects_malformed_node_ids(#[case] raw: &str) {
        let result = SuggestionId::new(raw);
        assert!(
            matches!(result, Err(GatewayError::InvalidNodeId { .. })),
            "expected InvalidNodeId, got {result:?}"
        );
    }
}
