//! Delivery of organization events to connected clients.

pub mod router;

pub use router::NotificationRouter;
