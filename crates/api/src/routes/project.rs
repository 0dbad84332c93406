//! Route definitions for the `/projects` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::project;
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                  -> list_projects
/// POST   /                  -> create_project
/// GET    /review-queue      -> review_queue
/// GET    /{id}              -> get_project
/// PUT    /{id}              -> update_project
/// DELETE /{id}              -> delete_project
/// POST   /{id}/approve      -> approve_project
/// POST   /{id}/reject       -> reject_project
/// POST   /{id}/resubmit     -> resubmit_project
/// POST   /{id}/endorse      -> endorse_project
/// DELETE /{id}/endorse      -> withdraw_endorsement
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list_projects).post(project::create_project))
        .route("/review-queue", get(project::review_queue))
        .route(
            "/{id}",
            get(project::get_project)
                .put(project::update_project)
                .delete(project::delete_project),
        )
        .route("/{id}/approve", post(project::approve_project))
        .route("/{id}/reject", post(project::reject_project))
        .route("/{id}/resubmit", post(project::resubmit_project))
        .route(
            "/{id}/endorse",
            post(project::endorse_project).delete(project::withdraw_endorsement),
        )
}
