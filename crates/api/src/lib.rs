//! KaryaKita API server library.
//!
//! Exposes config, state, error handling, the catalog service and routes so
//! integration tests and the binaries share one construction path.

pub mod auth;
pub mod background;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
