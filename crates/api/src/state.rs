use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the pool is reference counted and everything else is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: karyakita_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Review events are published here after every successful transition.
    pub event_bus: Arc<karyakita_events::EventBus>,
}
