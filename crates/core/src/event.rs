//! Domain events: what happened while handling a message.
//!
//! Components publish here instead of calling each other; subscribers (logs,
//! tests, the CLI's step printer) filter for what they care about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A message passed the guard chain
    MessageAdmitted {
        channel_id: String,
        message_id: String,
        author_id: String,
        timestamp: DateTime<Utc>,
    },

    /// The model answered (either tool calls or text)
    ModelResponded {
        model: String,
        tool_calls: usize,
        tokens_used: u32,
        timestamp: DateTime<Utc>,
    },

    /// A tool was invoked by the agent
    ToolInvoked {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The iteration cap was hit and the early-stopping policy kicked in
    IterationLimitReached {
        iterations: u32,
        timestamp: DateTime<Utc>,
    },

    /// A correction was written to the knowledge store
    CorrectionSaved {
        document_id: String,
        links: usize,
        timestamp: DateTime<Utc>,
    },

    /// A reply went out to the platform
    ResponseDelivered {
        channel_id: String,
        fragments: usize,
        timestamp: DateTime<Utc>,
    },

    /// Something failed and the event was dropped
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Cloning shares the same underlying channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_subscribers() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let publisher = bus.clone();

        publisher.publish(DomainEvent::ToolInvoked {
            tool_name: "search_web".into(),
            success: true,
            duration_ms: 42,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::ToolInvoked { tool_name, success, .. } => {
                assert_eq!(tool_name, "search_web");
                assert!(success);
            }
            other => panic!("Expected ToolInvoked, got {other:?}"),
        }
    }

    #[test]
    fn publish_without_subscribers() {
        let bus = EventBus::new(4);
        bus.publish(DomainEvent::ErrorOccurred {
            context: "test".into(),
            error_message: "nobody listening".into(),
            timestamp: Utc::now(),
        });
    }
}
