//! KaryaKita event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ReviewEvent`]: emitted after every successful review transition.
//!
//! Subscribers (the api crate's notification router) consume events on
//! their own task, so a slow or failing subscriber never delays or rolls back
//! the transition that produced the event.

pub mod bus;

pub use bus::{EventBus, ReviewEvent};
