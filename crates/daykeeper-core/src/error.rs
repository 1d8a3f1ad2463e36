//! Core error types for daykeeper-core.
//!
//! Errors here describe degraded side effects, not fatal conditions: the
//! engine itself never fails, and every storage or notification error is
//! recoverable by the next tick (see the service layer).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for daykeeper-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// State store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Notification trigger errors
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to create the store directory
    #[error("Failed to create store directory {path}: {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read an entry
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an entry
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Home/config directory could not be resolved
    #[error("Could not resolve a data directory")]
    NoDataDir,
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

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Notification trigger errors. Always non-fatal to state correctness.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Scheduling the alert failed
    #[error("Failed to schedule notification {id}: {message}")]
    ScheduleFailed { id: u32, message: String },

    /// Cancelling the alert failed
    #[error("Failed to cancel notification {id}: {message}")]
    CancelFailed { id: u32, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
