//! Correlation token shared across HTTP, logging and outbound calls
//!
//! ## Implementation Pattern
//! 1. Inbound: middleware extracts the token from the configured header or generates one
//! 2. In-flight: stored in request extensions, readable by handlers and clients
//! 3. Outbound: attached to downstream requests unless the caller already set the header
//! 4. Logging: captured as a span field by the log context middleware

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default HTTP header carrying the correlation token
pub const DEFAULT_CORRELATION_HEADER: &str = "X-Correlation-ID";

/// Opaque token tying a chain of requests and log events together.
///
/// Assigned once per request and immutable afterwards. The value is
/// whatever the caller supplied, or a generated UUID v4.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Wrap an existing token value, kept verbatim
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Generate a fresh token
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_is_canonical_uuid() {
        let id = CorrelationId::generate();
        assert_eq!(id.as_str().len(), 36); // UUID v4 string length
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_generated_tokens_differ() {
        assert_ne!(CorrelationId::generate(), CorrelationId::generate());
    }

    #[test]
    fn test_wrapped_token_kept_verbatim() {
        let id = CorrelationId::new("not-a-uuid at all");
        assert_eq!(id.as_str(), "not-a-uuid at all");
    }
}
