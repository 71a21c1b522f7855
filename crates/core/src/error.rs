//! Error types for the XQA workspace.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! retrieval, tokenization and inference failures.

use thiserror::Error;

/// Unified error type for the XQA workspace.
///
/// All fallible functions return `Result<T, AppError>`.
/// Non-test code never panics; errors are represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Search backend could not be reached (connection refused, timeout)
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// Target collection does not exist in the search backend
    #[error("Index not ready: {0}")]
    IndexNotReady(String),

    /// Search backend answered, but with an error or an unreadable payload
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Model input could not be assembled (separator lost during truncation)
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Inference backend could not be reached
    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(String),

    /// Inference backend returned an unusable result
    #[error("Inference error: {0}")]
    Inference(String),

    /// Tokenizer loading or encoding errors
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error fails a whole request rather than a single excerpt.
    ///
    /// Retrieval and configuration problems are request-level; everything that
    /// can go wrong while reading one excerpt is not.
    pub fn is_request_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Config(_)
                | AppError::RetrievalUnavailable(_)
                | AppError::IndexNotReady(_)
                | AppError::Retrieval(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_fatal_classification() {
        assert!(AppError::RetrievalUnavailable("down".into()).is_request_fatal());
        assert!(AppError::IndexNotReady("articles".into()).is_request_fatal());
        assert!(!AppError::MalformedInput("no [SEP]".into()).is_request_fatal());
        assert!(!AppError::OracleUnavailable("refused".into()).is_request_fatal());
        assert!(!AppError::Inference("empty".into()).is_request_fatal());
    }

    #[test]
    fn test_display_prefixes() {
        let err = AppError::IndexNotReady("articles".to_string());
        assert_eq!(err.to_string(), "Index not ready: articles");

        let err: AppError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(err.to_string().starts_with("Serialization error"));
    }
}
