//! Error types for the router pricing layer

use thiserror::Error;

/// Core errors shared by the workspace crates
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("{field} must be within [0, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        max: f64,
    },

    #[error("{field} has an empty key")]
    EmptyKey { field: &'static str },
}

/// Result type alias for router-core operations
pub type Result<T> = std::result::Result<T, Error>;

impl ConfigError {
    /// Get a stable machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unreadable { .. } => "config_unreadable",
            Self::ParseError { .. } => "config_parse_error",
            Self::OutOfRange { .. } => "config_out_of_range",
            Self::EmptyKey { .. } => "config_empty_key",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_codes() {
        let err = ConfigError::OutOfRange {
            field: "maxThresholdPercentageInBps",
            value: 12000.0,
            max: 10000.0,
        };
        assert_eq!(err.error_code(), "config_out_of_range");
        assert!(err.to_string().contains("12000"));

        let err: Error = ConfigError::EmptyKey {
            field: "weightDistributeByPool",
        }
        .into();
        assert!(matches!(err, Error::Config(ConfigError::EmptyKey { .. })));
    }
}
