//! Organization-scoped event fan-out.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`OrgEvent`]: the event envelope, always addressed to one organization.
//! - [`Notifier`]: the publishing front door used after a transaction
//!   commits. Unaffiliated actors produce no events.
//!
//! Delivery is at-most-once: there is no durable queue and no retry. A
//! subscriber that falls behind the channel capacity loses the oldest events.
//! State transitions never depend on a notification being delivered.

pub mod bus;
pub mod notifier;

pub use bus::{EventBus, OrgEvent};
pub use notifier::Notifier;

/// A new inspection was submitted.
pub const EVENT_INSPECTION_CREATED: &str = "inspection_created";
/// A submitted inspection was edited inside its edit window.
pub const EVENT_INSPECTION_UPDATED: &str = "inspection_updated";
/// A driver joined the organization.
pub const EVENT_DRIVER_JOINED: &str = "driver_joined";
/// A driver left the organization.
pub const EVENT_DRIVER_LEFT: &str = "driver_left";
