//! Review notifications.
//!
//! The [`NotificationRouter`] subscribes to the event bus and stores one
//! notification per review event for the project owner.

pub mod router;

pub use router::NotificationRouter;
