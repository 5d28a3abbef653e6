//! Error types for bastion-audit.

use crate::storage::guard::RefusalReason;
use thiserror::Error;

/// Result type alias for bastion-audit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in bastion-audit operations.
#[derive(Error, Debug)]
pub enum Error {
    // Request errors
    #[error("Invalid filter parameter `{field}`: {reason}")]
    InvalidFilter { field: String, reason: String },

    #[error("Deletion refused: {0}")]
    DeletionRefused(RefusalReason),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Backend errors
    #[error("Probe failed: {0}")]
    ProbeFailed(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a filter validation error.
    pub fn invalid_filter(field: &str, reason: impl Into<String>) -> Self {
        Error::InvalidFilter {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Error raised when a lock was poisoned by a panicking holder.
    pub(crate) fn poisoned(what: &str) -> Self {
        Error::Internal(format!("{} lock poisoned", what))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Error::Timeout(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_display() {
        let err = Error::invalid_filter("date_from", "not a date");
        assert_eq!(
            err.to_string(),
            "Invalid filter parameter `date_from`: not a date"
        );
    }

    #[test]
    fn test_deletion_refused_display() {
        let err = Error::DeletionRefused(RefusalReason::InUse);
        assert!(err.to_string().contains("in-use"));
    }

    #[test]
    fn test_from_serde_json() {
        let err: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, Error::SerializationError(_)));
    }
}
