//! Error types for `chatgate-core`.
//!
//! Admission decisions themselves never fail. Only loading and validating
//! configuration can, and those paths return [`CoreResult<T>`].

/// Unified error type for the core library.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The configuration is not valid TOML or has the wrong shape.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// A configuration value is syntactically fine but out of range.
    #[error("invalid config value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

/// Convenience alias used throughout `chatgate-core`.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_message() {
        let err = CoreError::ConfigParse("expected `=`".to_string());
        assert_eq!(err.to_string(), "config parse error: expected `=`");
    }

    #[test]
    fn invalid_config_names_field() {
        let err = CoreError::InvalidConfig {
            field: "rate_limit.max_requests",
            reason: "must be greater than zero".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for `rate_limit.max_requests`: must be greater than zero"
        );
    }
}
