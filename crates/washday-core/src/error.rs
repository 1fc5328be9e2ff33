//! Core error types for washday-core.
//!
//! Validation failures are the only errors a command reports as `Err`.
//! Persistence and notification failures are logged and surfaced beside the
//! in-memory transition that triggered them, never instead of it. A missing
//! id is not an error at all: mutators return `false`/`None`.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::CycleType;

/// Core error type for washday-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input rejected at the boundary; state unchanged
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Durable storage errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Completion alert scheduling errors
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Timer durations must be strictly positive
    #[error("Duration must be positive, got {seconds}s")]
    NonPositiveDuration { seconds: i64 },

    /// Supply consumption must be strictly positive
    #[error("Amount must be positive, got {amount}")]
    NonPositiveAmount { amount: f64 },

    /// A required name was blank
    #[error("'{field}' must not be empty")]
    EmptyName { field: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Persistence-specific errors.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Failed to open the store
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Store is locked by another writer
    #[error("Store is locked")]
    Locked,

    /// A collection could not be encoded
    #[error("Failed to encode '{collection}': {message}")]
    Encode { collection: String, message: String },
}

/// Notification-specific errors.
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Failed to schedule {cycle_type} alert: {message}")]
    ScheduleFailed {
        cycle_type: CycleType,
        message: String,
    },

    #[error("Failed to cancel {cycle_type} alert: {message}")]
    CancelFailed {
        cycle_type: CycleType,
        message: String,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                PersistenceError::Locked
            }
            _ => PersistenceError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_the_input() {
        let err = ValidationError::NonPositiveDuration { seconds: -5 };
        assert_eq!(err.to_string(), "Duration must be positive, got -5s");

        let err = CoreError::from(ValidationError::EmptyName {
            field: "name".into(),
        });
        assert_eq!(err.to_string(), "Validation error: 'name' must not be empty");
    }

    #[test]
    fn sqlite_failures_map_to_query_failed() {
        let err = PersistenceError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, PersistenceError::QueryFailed(_)));
    }
}
