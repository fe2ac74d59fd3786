//! Error types for the tactical core.
//!
//! The per-tick decision path never fails; these errors only surface from
//! loading configuration, game constants and command logs, or from building a
//! controller with an invalid configuration.

use thiserror::Error;

/// Result type alias using [`TacticsError`].
pub type Result<T> = std::result::Result<T, TacticsError>;

/// Top-level error type for the tactical core.
#[derive(Debug, Error)]
pub enum TacticsError {
    /// Failed to read a configuration or constants file.
    #[error("Failed to read '{path}': {source}")]
    ReadError {
        /// Path of the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration or constants file could not be parsed.
    #[error("Failed to parse '{path}': {message}")]
    ParseError {
        /// Path (or `<inline>` for strings).
        path: String,
        /// Parser message.
        message: String,
    },

    /// A configuration value is out of range.
    #[error("Invalid configuration value for `{field}`: {reason}")]
    InvalidConfig {
        /// Offending field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Command log could not be written or read.
    #[error("Command log error: {0}")]
    CommandLog(String),

    /// Command log was written by an incompatible format version.
    #[error("Command log version mismatch: expected {expected}, got {found}")]
    LogVersionMismatch {
        /// Supported version.
        expected: u32,
        /// Version found in the file.
        found: u32,
    },

    /// Invalid controller state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl TacticsError {
    /// Build a [`TacticsError::InvalidConfig`].
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
