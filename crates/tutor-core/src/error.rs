//! Error types for the tutoring client core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generation::GenerationError;
use crate::task::TaskStatus;

/// A shared error type for the background task tracker and its adapters.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum TutorError {
    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Configuration could not be written out.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A task was asked to move backwards or out of a terminal state.
    #[error("Invalid transition for task '{task_id}': {from} -> {to}")]
    InvalidTransition {
        task_id: String,
        from: TaskStatus,
        to: TaskStatus,
    },

    /// The remote generation request was rejected.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TutorError {
    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns the underlying generation error, if this wraps one.
    pub fn as_generation(&self) -> Option<&GenerationError> {
        match self {
            Self::Generation(err) => Some(err),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for TutorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<toml::ser::Error> for TutorError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, TutorError>`.
pub type Result<T> = std::result::Result<T, TutorError>;
