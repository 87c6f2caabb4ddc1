//! Core error types for rounds-core.
//!
//! Error hierarchy built on thiserror. Validation failures carry the offending
//! field so frontends can highlight the right input.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for rounds-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Routine storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
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

/// Routine-store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Store file exists but cannot be parsed
    #[error("Failed to parse routine store at {path}: {message}")]
    ParseFailed { path: PathBuf, message: String },

    /// Store file cannot be written
    #[error("Failed to write routine store at {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Lookup by id found nothing
    #[error("Routine not found: {0}")]
    RoutineNotFound(String),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown or malformed dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Value cannot be parsed for the key's type
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors for routines and exercises.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Field violations collected in one pass over the routine
    #[error("Validation failed: {}", format_violations(.0))]
    Invalid(Vec<FieldError>),
}

/// A single field violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

fn format_violations(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
