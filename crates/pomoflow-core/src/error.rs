//! Core error types for pomoflow-core.
//!
//! Invalid input (negative durations, unknown timer names) is rejected
//! synchronously with a named error and leaves state unchanged. Redundant
//! control commands are not errors; they are benign no-ops reported through
//! a `tracing` diagnostic.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomoflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Negative component supplied to a timer constructor or duration edit.
    #[error("invalid duration: time values must be non-negative (got {hours}h {minutes}m {seconds}s)")]
    InvalidDuration {
        hours: i64,
        minutes: i64,
        seconds: i64,
    },

    /// Operation referenced a timer outside the three fixed phases.
    #[error("unknown timer '{0}' (expected \"work\", \"short break\" or \"long break\")")]
    UnknownTimer(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
