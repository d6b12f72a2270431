//! Notification adapters for hosts without a native notification surface.
//!
//! Both adapters write to `tracing`; a desktop host replaces them with its
//! own [`NotificationGateway`] and [`ToastSink`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tutor_core::config::NotificationConfig;
use tutor_core::notification::{NotificationGateway, Toast, ToastLevel, ToastSink};
use tutor_core::task::TaskKind;

/// Gateway whose permission answer comes from `notifications.enabled`.
#[derive(Debug)]
pub struct TracingNotificationGateway {
    enabled: bool,
    granted: AtomicBool,
    delivered: AtomicU64,
}

impl TracingNotificationGateway {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            enabled: config.enabled,
            granted: AtomicBool::new(false),
            delivered: AtomicU64::new(0),
        }
    }

    /// Notifications emitted since creation, permission permitting.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl NotificationGateway for TracingNotificationGateway {
    async fn request_permission(&self) -> bool {
        self.granted.store(self.enabled, Ordering::SeqCst);
        tracing::info!(target: "notifications", granted = self.enabled, "Notification permission requested");
        self.enabled
    }

    fn is_permission_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    async fn notify_content_ready(&self, kind: TaskKind, title: &str) {
        if !self.is_permission_granted() {
            tracing::debug!(target: "notifications", %kind, "Permission not granted, dropping notification");
            return;
        }
        let (heading, body) = kind.content_ready_copy(title);
        self.delivered.fetch_add(1, Ordering::Relaxed);
        tracing::info!(target: "notifications", %kind, "{}: {}", heading, body);
    }

    fn notify_progress(&self, message: &str) {
        if self.is_permission_granted() {
            self.delivered.fetch_add(1, Ordering::Relaxed);
            tracing::info!(target: "notifications", "{}", message);
        }
    }
}

/// Toast sink that logs each toast at a matching level.
#[derive(Debug, Default)]
pub struct TracingToastSink;

impl ToastSink for TracingToastSink {
    fn show(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Success | ToastLevel::Info => {
                tracing::info!(target: "toasts", "{}: {}", toast.title, toast.message)
            }
            ToastLevel::Warning => {
                tracing::warn!(target: "toasts", "{}: {}", toast.title, toast.message)
            }
            ToastLevel::Error => {
                tracing::error!(target: "toasts", "{}: {}", toast.title, toast.message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_permission_follows_config() {
        let gateway = TracingNotificationGateway::new(&NotificationConfig { enabled: true });
        assert!(!gateway.is_permission_granted());
        assert!(gateway.request_permission().await);
        assert!(gateway.is_permission_granted());

        let gateway = TracingNotificationGateway::new(&NotificationConfig { enabled: false });
        assert!(!gateway.request_permission().await);
        assert!(!gateway.is_permission_granted());
    }

    #[tokio::test]
    async fn test_notify_requires_permission() {
        let gateway = TracingNotificationGateway::new(&NotificationConfig::default());
        gateway.notify_content_ready(TaskKind::Modules, "Rust").await;
        gateway.notify_progress("Writing...");
        assert_eq!(gateway.delivered(), 0);

        assert!(gateway.request_permission().await);
        gateway.notify_content_ready(TaskKind::Modules, "Rust").await;
        gateway.notify_progress("Writing...");
        assert_eq!(gateway.delivered(), 2);
    }

    #[tokio::test]
    async fn test_disabled_gateway_never_delivers() {
        let gateway = TracingNotificationGateway::new(&NotificationConfig { enabled: false });
        gateway.request_permission().await;
        gateway.notify_content_ready(TaskKind::Topics, "Traits").await;
        gateway.notify_progress("Finalizing...");

        assert_eq!(gateway.delivered(), 0);
    }
}
