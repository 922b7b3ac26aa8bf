//! Post-commit publishing front door.

use std::sync::Arc;

use serde_json::Value;
use tripcheck_core::types::DbId;

use crate::bus::{EventBus, OrgEvent};

/// Publishes lifecycle and membership changes to organization channels.
///
/// Call only after the triggering transaction has committed. Publishing
/// never fails the caller: a missing organization is a no-op and an event
/// with no listeners is logged and dropped.
#[derive(Clone)]
pub struct Notifier {
    bus: Arc<EventBus>,
}

impl Notifier {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    /// Publish `event_type` to the channel of `org_id`.
    ///
    /// Returns `true` if the event reached at least one subscriber.
    pub fn publish(
        &self,
        org_id: Option<DbId>,
        event_type: &str,
        source: Option<(&str, DbId)>,
        actor_id: Option<DbId>,
        payload: Value,
    ) -> bool {
        let Some(org_id) = org_id else {
            tracing::trace!(event_type, "No organization scope, skipping notification");
            return false;
        };

        let mut event = OrgEvent::new(org_id, event_type).with_payload(payload);
        if let Some((entity_type, entity_id)) = source {
            event = event.with_source(entity_type, entity_id);
        }
        if let Some(actor_id) = actor_id {
            event = event.with_actor(actor_id);
        }

        let delivered = self.bus.publish(event);
        if delivered == 0 {
            tracing::debug!(org_id, event_type, "Notification dropped, no subscribers");
        } else {
            tracing::debug!(org_id, event_type, delivered, "Notification published");
        }
        delivered > 0
    }
}
