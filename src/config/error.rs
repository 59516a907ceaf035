//! Error types for the configuration store

use std::path::PathBuf;
use thiserror::Error;

use super::fields::{FieldKind, Section};

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file missing or unreadable
    #[error("Failed to read config file {path}: {source}")]
    Load {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Config file content does not match the expected structure
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// No field with this name exists in the section
    #[error("Unknown field {section}.{field}")]
    FieldNotFound { section: Section, field: String },

    /// Supplied value type differs from the field's declared type
    #[error("Type mismatch for {section}.{field}: expected {expected}, got {found}")]
    TypeMismatch {
        section: Section,
        field: String,
        expected: FieldKind,
        found: FieldKind,
    },

    /// Field exists but is display-only
    #[error("Field {section}.{field} is read-only")]
    ReadOnlyField { section: Section, field: String },

    /// Value has the right type but cannot be represented by the field
    #[error("Invalid value for {section}.{field}: {reason}")]
    InvalidValue {
        section: Section,
        field: String,
        reason: String,
    },

    /// Config file could not be serialized or written back
    #[error("Failed to write config file {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// File watcher could not be installed
    #[error("Failed to watch config file: {0}")]
    Watch(#[from] notify::Error),
}
