use thiserror::Error;

/// Top-level error type shared by the Converse crates.
///
/// Subsystem crates define their own error types; those that load
/// configuration implement `From<ConverseError>` so failures propagate with
/// `?` across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConverseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ConverseError {
    fn from(err: toml::de::Error) -> Self {
        ConverseError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ConverseError {
    fn from(err: toml::ser::Error) -> Self {
        ConverseError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ConverseError {
    fn from(err: serde_json::Error) -> Self {
        ConverseError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Converse operations.
pub type Result<T> = std::result::Result<T, ConverseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConverseError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = ConverseError::Serialization("bad json".to_string());
        assert_eq!(err.to_string(), "Serialization error: bad json");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ConverseError = io_err.into();
        assert!(matches!(err, ConverseError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let err: ConverseError = toml_err.into();
        assert!(matches!(err, ConverseError::Config(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ConverseError = json_err.into();
        assert!(matches!(err, ConverseError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error: "));
    }
}
