use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST   /register  -> register
/// POST   /login     -> login
/// POST   /guest     -> guest
/// POST   /logout    -> logout
/// GET    /session   -> session
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/guest", post(auth::guest))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session))
}
