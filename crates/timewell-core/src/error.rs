//! Core error types for timewell-core.
//!
//! Invalid-state conditions (resuming a timer that is not paused, skipping
//! while the pomodoro machine is idle) are deliberately not errors: the UI
//! may race with background ticks, so those degrade to silent no-ops. The
//! types here cover the conditions a caller has to act on.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::{SubjectId, TimerId};

/// Core error type for timewell-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Timer ledger errors
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// Pomodoro machine errors
    #[error("Pomodoro error: {0}")]
    Pomodoro(#[from] PomodoroError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Timer ledger errors.
///
/// `NotFound` is recoverable by design: the referenced timer no longer
/// exists and the caller's view already reflects the removal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Operation referenced a timer id that is not in the ledger
    #[error("No running timer with id {0}")]
    NotFound(TimerId),

    /// The subject already has a live timer in this ledger
    #[error("Subject '{0}' already has a running timer")]
    AlreadyRunning(SubjectId),
}

/// Pomodoro machine errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PomodoroError {
    /// `start` was called with no configuration available.
    /// Surfaced (not silent) because resolving it requires user action.
    #[error("No pomodoro configuration available")]
    ConfigurationMissing,

    /// `start` was given a configuration that fails validation
    #[error("Invalid pomodoro configuration: {0}")]
    InvalidConfiguration(#[from] ValidationError),
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

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

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

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Rollover hour outside `0..=23`
    #[error("Rollover hour must be in 0..=23, got {0}")]
    RolloverHourOutOfRange(u8),

    /// Day key string that does not parse as `YYYY-MM-DD`
    #[error("Malformed day key: '{0}'")]
    MalformedDayKey(String),

    /// Invalid duration or count in a pomodoro configuration
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
