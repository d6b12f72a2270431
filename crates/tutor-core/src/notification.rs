//! User-facing feedback channels.
//!
//! Two independent sinks exist: the permission-gated system notification
//! gateway and the in-app toast surface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::task::TaskKind;

/// Wraps the platform's permission-gated notification capability.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Asks the platform for permission. Returns whether it was granted.
    async fn request_permission(&self) -> bool;

    fn is_permission_granted(&self) -> bool;

    /// Announces that generated content of `kind` titled `title` is ready.
    async fn notify_content_ready(&self, kind: TaskKind, title: &str);

    /// Surfaces an intermediate status line.
    fn notify_progress(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToastLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient in-app message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub title: String,
    pub message: String,
}

impl Toast {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Success, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Info, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Error, title, message)
    }

    fn new(level: ToastLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Displays toasts in the host UI.
pub trait ToastSink: Send + Sync {
    fn show(&self, toast: Toast);
}
