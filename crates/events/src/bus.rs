//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`OrgEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tripcheck_core::types::DbId;

// ---------------------------------------------------------------------------
// OrgEvent
// ---------------------------------------------------------------------------

/// A change that members of one organization should hear about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgEvent {
    /// The organization whose channel receives the event.
    pub org_id: DbId,

    /// Event name, e.g. `"inspection_created"`.
    pub event_type: String,

    /// Optional source entity kind (e.g. `"inspection"`, `"user"`).
    pub source_entity_type: Option<String>,

    /// Optional source entity database id.
    pub source_entity_id: Option<DbId>,

    /// Optional id of the user that triggered the event.
    pub actor_user_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl OrgEvent {
    pub fn new(org_id: DbId, event_type: impl Into<String>) -> Self {
        Self {
            org_id,
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`OrgEvent`].
///
/// ```rust
/// use tripcheck_events::bus::{EventBus, OrgEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(OrgEvent::new(7, "inspection_created"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<OrgEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers the event was handed to; zero means
    /// it was dropped.
    pub fn publish(&self, event: OrgEvent) -> usize {
        // A SendError only means there are zero receivers.
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrgEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = OrgEvent::new(7, "inspection_created")
            .with_source("inspection", 42)
            .with_actor(3)
            .with_payload(serde_json::json!({"type": "pre-trip"}));

        assert_eq!(bus.publish(event), 1);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.org_id, 7);
        assert_eq!(received.event_type, "inspection_created");
        assert_eq!(received.source_entity_type.as_deref(), Some("inspection"));
        assert_eq!(received.source_entity_id, Some(42));
        assert_eq!(received.actor_user_id, Some(3));
        assert_eq!(received.payload["type"], "pre-trip");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(OrgEvent::new(1, "driver_joined"));

        assert_eq!(rx1.recv().await.unwrap().event_type, "driver_joined");
        assert_eq!(rx2.recv().await.unwrap().event_type, "driver_joined");
    }

    #[test]
    fn publish_with_no_subscribers_is_dropped() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(OrgEvent::new(1, "orphan")), 0);
    }

    #[tokio::test]
    async fn slow_subscriber_lags_instead_of_blocking() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for i in 0..5 {
            bus.publish(OrgEvent::new(i, "inspection_updated"));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
        assert_eq!(rx.recv().await.unwrap().org_id, 3);
    }
}
