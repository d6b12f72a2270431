//! Typed domain events.
//!
//! Completed background generations are announced on an [`EventBus`] so that
//! unrelated consumers (a list page that needs refreshing, say) can react
//! without the task registry knowing about them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::task::TaskKind;

/// Payload shared by every generation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationEvent {
    pub title: String,
    pub task_id: String,
    pub result: Value,
}

/// High-level events published when background generation succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    LearningPathCreated(GenerationEvent),
    ModulesGenerated(GenerationEvent),
    TopicsGenerated(GenerationEvent),
}

impl DomainEvent {
    /// Event announcing a successful generation of `kind`, if that kind has one.
    pub fn for_kind(kind: TaskKind, payload: GenerationEvent) -> Option<Self> {
        match kind {
            TaskKind::LearningPath | TaskKind::OnboardingPath => {
                Some(Self::LearningPathCreated(payload))
            }
            TaskKind::Modules => Some(Self::ModulesGenerated(payload)),
            TaskKind::Topics => Some(Self::TopicsGenerated(payload)),
            TaskKind::Course => None,
        }
    }

    pub fn payload(&self) -> &GenerationEvent {
        match self {
            Self::LearningPathCreated(p) | Self::ModulesGenerated(p) | Self::TopicsGenerated(p) => p,
        }
    }
}

const DEFAULT_CAPACITY: usize = 64;

/// Broadcast channel for [`DomainEvent`]s. Clones share the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Publishes to every current subscriber. Returns how many received it.
    pub fn publish(&self, event: DomainEvent) -> usize {
        // No subscribers is not an error
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> GenerationEvent {
        GenerationEvent {
            title: "Rust".to_string(),
            task_id: "t-1".to_string(),
            result: json!({"pathId": "p-1"}),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.clone().subscribe();

        let delivered = bus.publish(DomainEvent::LearningPathCreated(payload()));

        assert_eq!(delivered, 2);
        assert_eq!(first.recv().await.unwrap().payload().title, "Rust");
        assert!(matches!(
            second.recv().await.unwrap(),
            DomainEvent::LearningPathCreated(_)
        ));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(DomainEvent::TopicsGenerated(payload())), 0);
    }

    #[test]
    fn test_event_for_kind() {
        assert!(matches!(
            DomainEvent::for_kind(TaskKind::OnboardingPath, payload()),
            Some(DomainEvent::LearningPathCreated(_))
        ));
        assert!(matches!(
            DomainEvent::for_kind(TaskKind::Modules, payload()),
            Some(DomainEvent::ModulesGenerated(_))
        ));
        assert!(DomainEvent::for_kind(TaskKind::Course, payload()).is_none());
    }

    #[test]
    fn test_event_wire_format() {
        let value = serde_json::to_value(DomainEvent::ModulesGenerated(payload())).unwrap();
        assert_eq!(value["type"], json!("modules_generated"));
        assert_eq!(value["taskId"], json!("t-1"));
    }
}
