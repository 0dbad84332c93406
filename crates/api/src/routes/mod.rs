pub mod auth;
pub mod health;
pub mod notification;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/register                        register student account (public)
/// /auth/login                           login with email or NIM (public)
/// /auth/guest                           start guest session (public)
/// /auth/logout                          revoke current session
/// /auth/session                         current session and profile
///
/// /projects                             list visible, create
/// /projects/review-queue                pending submissions (lecturer/admin)
/// /projects/{id}                        get, update, delete
/// /projects/{id}/approve                approve (lecturer/admin)
/// /projects/{id}/reject                 reject with notes (lecturer/admin)
/// /projects/{id}/resubmit               resubmit after rejection (owner)
/// /projects/{id}/endorse                endorse (POST), withdraw (DELETE)
///
/// /notifications                        list own
/// /notifications/unread-count           unread count
/// /notifications/read-all               mark all read
/// /notifications/{id}/read              mark one read
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/projects", project::router())
        .nest("/notifications", notification::router())
}
