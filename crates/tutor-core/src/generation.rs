//! Remote generation contract.
//!
//! The long-running AI generation endpoints live behind [`GenerationApi`].
//! Implementations translate transport failures into [`GenerationError`] at
//! their boundary so that retry decisions are a pattern match rather than a
//! search through error strings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Learner preferences sent along with a learning path request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub goals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_hours: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_style: Option<String>,
    /// Anything the onboarding form adds that the tracker does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Coarse grouping used by the failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Believed to succeed if the same request is sent again.
    TransientRemote,
    /// No connectivity, connection errors and timeouts.
    Network,
    /// The request itself was rejected.
    Validation,
    Other,
}

/// Structured rejection of a generation request.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationError {
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// The known intermittent backend failure that clears on a second attempt.
    #[error("Transient server failure: {message}")]
    KnownTransientBug { message: String },

    #[error("Service unavailable: {message}")]
    Unavailable { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("{message}")]
    Other { message: String },
}

impl GenerationError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::KnownTransientBug { .. } | Self::Unavailable { .. } => ErrorClass::TransientRemote,
            Self::Server { status, .. } if *status >= 500 => ErrorClass::TransientRemote,
            Self::Server { .. } | Self::InvalidRequest { .. } => ErrorClass::Validation,
            Self::Network { .. } | Self::Timeout { .. } => ErrorClass::Network,
            Self::Other { .. } => ErrorClass::Other,
        }
    }

    /// Only the known backend bug is retried without asking the learner.
    pub fn is_auto_retryable(&self) -> bool {
        matches!(self, Self::KnownTransientBug { .. })
    }
}

/// The long-running, network-bound generation operations.
///
/// Each call may take minutes. Request timeouts are the implementation's
/// responsibility and surface as [`GenerationError::Timeout`].
#[async_trait]
pub trait GenerationApi: Send + Sync {
    /// Creates a learning path for `subject`.
    async fn create_learning_path(
        &self,
        subject: &str,
        preferences: &LearningPreferences,
    ) -> Result<Value, GenerationError>;

    /// Generates the modules of an existing learning path.
    async fn generate_modules(&self, path_id: &str) -> Result<Value, GenerationError>;

    /// Generates the topic content of an existing module.
    async fn generate_topic_content(&self, module_id: &str) -> Result<Value, GenerationError>;
}
