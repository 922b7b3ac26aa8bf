//! Event-to-room routing.
//!
//! [`NotificationRouter`] subscribes to the organization event bus and pushes
//! each event to every WebSocket connection in the event's organization room.

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::broadcast;
use tripcheck_events::OrgEvent;

use crate::ws::WsManager;

pub struct NotificationRouter {
    ws_manager: Arc<WsManager>,
}

impl NotificationRouter {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the main routing loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](tripcheck_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<OrgEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.deliver(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Push one event to its organization room. Returns the number of
    /// connections reached.
    pub async fn deliver(&self, event: &OrgEvent) -> usize {
        let sent = self
            .ws_manager
            .send_to_org(event.org_id, Message::Text(envelope(event).to_string().into()))
            .await;
        tracing::debug!(
            org_id = event.org_id,
            event_type = %event.event_type,
            sent,
            "Delivered organization event"
        );
        sent
    }
}

/// Wire format of a pushed event.
pub fn envelope(event: &OrgEvent) -> serde_json::Value {
    serde_json::json!({
        "event": event.event_type,
        "org_id": event.org_id,
        "data": event.payload,
        "timestamp": event.timestamp,
    })
}
