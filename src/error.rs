//! Error taxonomy for storage and configuration operations.

use serde::Serialize;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Storage errors
    StorageUnavailable,
    InvalidKey,

    // Semantic errors surfaced to the user
    InvalidConfiguration,
    IntegrityCheckFailed,
    InvalidBackupFormat,

    // Internal errors
    SerializationError,
    IoError,
}

/// Errors produced by the store adapters, the storage service and the config manager.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying persistent store is absent, full, or otherwise failing.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A storage key was empty.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// A mutation would leave the document violating one or more rules.
    #[error("invalid configuration: {}", .0.join("; "))]
    InvalidConfiguration(Vec<String>),

    /// An imported document does not match its checksum.
    #[error("integrity check failed: expected checksum {expected}, computed {actual}")]
    IntegrityCheckFailed { expected: String, actual: String },

    /// A backup or export payload lacks its required fields.
    #[error("invalid backup format: {0}")]
    InvalidBackupFormat(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::StorageUnavailable(_) => ErrorCode::StorageUnavailable,
            Error::InvalidKey(_) => ErrorCode::InvalidKey,
            Error::InvalidConfiguration(_) => ErrorCode::InvalidConfiguration,
            Error::IntegrityCheckFailed { .. } => ErrorCode::IntegrityCheckFailed,
            Error::InvalidBackupFormat(_) => ErrorCode::InvalidBackupFormat,
            Error::Serialization(_) => ErrorCode::SerializationError,
            Error::Io(_) => ErrorCode::IoError,
        }
    }

    /// Convenience constructor for a single violated rule.
    pub fn invalid(rule: impl Into<String>) -> Self {
        Error::InvalidConfiguration(vec![rule.into()])
    }

    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Error::StorageUnavailable(err.to_string())
    }

    /// Whether this error should be shown to the user rather than only logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::InvalidConfiguration(_)
                | Error::IntegrityCheckFailed { .. }
                | Error::InvalidBackupFormat(_)
        )
    }

    /// Structured form printed by the CLI.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code(),
            message: self.to_string(),
            errors: match self {
                Error::InvalidConfiguration(errors) => errors.clone(),
                _ => Vec::new(),
            },
        }
    }
}

/// Serializable error payload.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Result type for storage and configuration operations.
pub type Result<T> = std::result::Result<T, Error>;
