//! Configuration errors raised at construction time
//!
//! These abort startup; request handling never produces them.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("header name must not be empty")]
    EmptyHeaderName,

    #[error("`{0}` is not a valid HTTP header name")]
    InvalidHeaderName(String),

    #[error("at least one valid API key is required")]
    EmptyApiKeys,

    #[error("either a header name or a query parameter name is required")]
    MissingLookupName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failing_option() {
        assert_eq!(
            ConfigError::InvalidHeaderName("bad name".into()).to_string(),
            "`bad name` is not a valid HTTP header name"
        );
        assert_eq!(
            ConfigError::EmptyApiKeys.to_string(),
            "at least one valid API key is required"
        );
    }
}
