//! Core error types for finite-core.
//!
//! This module defines the error hierarchy using thiserror. Only input
//! validation and storage/config access can fail; the countdown math itself
//! is total once a [`CountdownTarget`](crate::CountdownTarget) exists.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for finite-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tick scheduler errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Notification(#[from] NotifyError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors raised when building countdown inputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Life expectancy must be a finite, strictly positive number of years.
    #[error("Expected lifespan must be positive, got {value}")]
    NonPositiveExpectancy { value: f64 },

    /// Invalid time range
    #[error("Invalid time range: target ({end}) must not precede start ({start})")]
    InvalidTimeRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    /// Unparseable or out-of-range date
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Birth date plus lifespan lands outside the representable date range.
    #[error("Expected lifespan of {value} years ends beyond the supported date range")]
    LifespanOutOfRange { value: f64 },
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// No row for the requested id
    #[error("No countdown event with id {id}")]
    NotFound { id: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
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

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Tick scheduler errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// `start` was called outside of a tokio runtime.
    #[error("No async runtime available to drive the tick scheduler")]
    NoRuntime,
}

/// Errors reported by a [`Notifier`](crate::notify::Notifier).
///
/// These never escape a tick; the watch logs them and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The host refused notification permission.
    #[error("Notification permission denied")]
    PermissionDenied,

    /// The host accepted the request but could not deliver it.
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
