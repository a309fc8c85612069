//! Domain error types
//!
//! This module defines the error hierarchy for the anonymizer. Errors are
//! domain-specific and don't expose third-party types.
//!
//! Most parse problems inside one line or record are *not* errors: the
//! rewriters skip or count them and move on. The variants here cover the
//! failures that stop a whole operation (unreadable files, broken
//! configuration).

use thiserror::Error;

/// Main anonymizer error type
#[derive(Debug, Error)]
pub enum AnonError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A caller-supplied key/value specification could not be normalized
    #[error("Specification error: {0}")]
    Spec(#[from] SpecError),

    /// Input that is structurally unusable (not a single bad line)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors raised while normalizing a key/value specification
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// The specification was neither a string, a list of strings nor a map
    #[error("Invalid specification kind: expected string, list or table, got {0}")]
    InvalidSpecKind(String),
}

impl From<std::io::Error> for AnonError {
    fn from(err: std::io::Error) -> Self {
        AnonError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AnonError {
    fn from(err: serde_json::Error) -> Self {
        AnonError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for AnonError {
    fn from(err: toml::de::Error) -> Self {
        AnonError::Configuration(format!("TOML parse error: {err}"))
    }
}
