//! Error types for the runtime layer

use discovery_core::ConfidenceError;
use thiserror::Error;

/// Main error type for session operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A confidence reading could not be normalized
    #[error("Invalid confidence: {0}")]
    Confidence(#[from] ConfidenceError),

    /// Unknown task
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected input (empty message and the like)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration values that parse but make no sense
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage-specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Failed to write task: {0}")]
    WriteFailed(String),

    #[error("Task not found in storage: {0}")]
    NotFound(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Transient failures are worth another attempt; a missing document is not
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::WriteFailed(_) | StorageError::Unavailable(_))
    }
}

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::NotFound("task t1".to_string());
        assert_eq!(err.to_string(), "Not found: task t1");
    }

    #[test]
    fn test_storage_error_converts() {
        let err: EngineError = StorageError::Unavailable("offline".into()).into();
        assert!(err.to_string().contains("offline"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(StorageError::WriteFailed("x".into()).is_retryable());
        assert!(StorageError::Unavailable("x".into()).is_retryable());
        assert!(!StorageError::NotFound("x".into()).is_retryable());
    }
}
