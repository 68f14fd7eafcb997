use thiserror::Error;

/// Common error types shared by the drip crates
#[derive(Error, Debug)]
pub enum DripError {
    /// Malformed account identifier
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, DripError>;

impl From<serde_json::Error> for DripError {
    fn from(err: serde_json::Error) -> Self {
        DripError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for DripError {
    fn from(err: bincode::Error) -> Self {
        DripError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for DripError {
    fn from(err: config::ConfigError) -> Self {
        DripError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DripError::InvalidAddress("too short".into());
        assert_eq!(err.to_string(), "Invalid address: too short");

        let err: DripError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, DripError::Serialization(_)));

        let err: DripError = config::ConfigError::Message("missing key".into()).into();
        assert_eq!(err.to_string(), "Configuration error: missing key");
    }
}
