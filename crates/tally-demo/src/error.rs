//! Tally demo: error types.

use tally_core::error::DomainError;
use thiserror::Error;

/// Startup and runtime errors for the demo binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable holds an invalid value.
    #[error("configuration error: {0}")]
    Config(String),

    /// A seeded command was rejected.
    #[error("command failed: {0}")]
    Domain(#[from] DomainError),

    /// Event serialization for console output failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_domain_error_converts_and_keeps_message() {
        let id = Uuid::new_v4();

        let err: AppError = DomainError::AggregateNotFound(id).into();

        assert!(matches!(err, AppError::Domain(_)));
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_config_error_display() {
        let err = AppError::Config("LOG_FORMAT must be json or pretty".into());
        assert_eq!(
            err.to_string(),
            "configuration error: LOG_FORMAT must be json or pretty"
        );
    }
}
