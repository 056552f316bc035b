//! Error types for descry.

use thiserror::Error;

/// Result type alias using descry's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for descry operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Outcome of a failed extraction, tagged by how the worker should react.
///
/// `Unclassified` covers anything the backend did not label itself (panics,
/// timeouts, unexpected response shapes). The worker treats it like
/// `Transient`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The input can never be processed (missing, oversized, corrupt).
    #[error("{0}")]
    Permanent(String),

    /// The failure may go away on retry (network, model download, OOM).
    #[error("{0}")]
    Transient(String),

    /// Failure that no backend classified.
    #[error("{0}")]
    Unclassified(String),
}

impl ExtractionError {
    /// The human-readable message carried by any variant.
    pub fn message(&self) -> &str {
        match self {
            Self::Permanent(msg) | Self::Transient(msg) | Self::Unclassified(msg) => msg,
        }
    }
}

impl From<Error> for ExtractionError {
    fn from(e: Error) -> Self {
        match e {
            Error::InvalidInput(msg) => ExtractionError::Permanent(msg),
            other => ExtractionError::Unclassified(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("unknown model".to_string());
        assert_eq!(err.to_string(), "Invalid input: unknown model");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("bad RETRY_DELAYS_SECS".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad RETRY_DELAYS_SECS");
    }

    #[test]
    fn test_error_display_internal() {
        let err = Error::Internal("lease was not issued by this queue".to_string());
        assert_eq!(
            err.to_string(),
            "Internal error: lease was not issued by this queue"
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
        assert_send_sync::<ExtractionError>();
    }

    #[test]
    fn test_extraction_error_message() {
        assert_eq!(ExtractionError::Permanent("gone".into()).message(), "gone");
        assert_eq!(ExtractionError::Transient("later".into()).message(), "later");
        assert_eq!(ExtractionError::Unclassified("??".into()).message(), "??");
    }

    #[test]
    fn test_extraction_error_display_is_bare_message() {
        let err = ExtractionError::Permanent("Image file not found: /x.png".into());
        assert_eq!(err.to_string(), "Image file not found: /x.png");
    }

    #[test]
    fn test_extraction_error_from_core_error() {
        let permanent: ExtractionError = Error::InvalidInput("bad".into()).into();
        assert!(matches!(permanent, ExtractionError::Permanent(_)));

        let config: ExtractionError = Error::Config("bad".into()).into();
        assert!(matches!(config, ExtractionError::Unclassified(_)));

        let unclassified: ExtractionError = Error::Internal("boom".into()).into();
        assert_eq!(
            unclassified,
            ExtractionError::Unclassified("Internal error: boom".into())
        );
    }
}
