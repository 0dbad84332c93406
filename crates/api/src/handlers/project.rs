//! Handlers for the `/projects` resource.
//!
//! Handlers parse requests and shape responses; every policy decision is
//! made in [`crate::catalog`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use karyakita_core::project::ProjectDraft;
use karyakita_core::review::{ReviewStatus, Transition};
use karyakita_core::types::DbId;
use serde::Deserialize;

use crate::catalog::{self, CatalogFilter, EndorsementState, ProjectView};
use crate::error::AppResult;
use crate::middleware::auth::{AuthUser, CurrentViewer};
use crate::middleware::rbac::RequireStaff;
use crate::query::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /projects`.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectListQuery {
    pub search: Option<String>,
    pub department: Option<String>,
    pub category: Option<String>,
    pub year: Option<i32>,
    /// `pending`, `published` or `rejected`.
    pub review_status: Option<String>,
    /// Only the caller's own projects.
    pub mine: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ProjectListQuery {
    fn into_filter(self) -> AppResult<CatalogFilter> {
        let review_status = match non_blank(self.review_status) {
            Some(name) => Some(ReviewStatus::parse(&name)?),
            None => None,
        };
        Ok(CatalogFilter {
            search: non_blank(self.search),
            department: non_blank(self.department),
            category: non_blank(self.category),
            year: self.year,
            review_status,
            mine: self.mine.unwrap_or(false),
            limit: clamp_limit(self.limit, DEFAULT_LIMIT, MAX_LIMIT),
            offset: clamp_offset(self.offset),
        })
    }
}

/// Body for approve, reject and resubmit. Optional for approve and resubmit.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewRequest {
    pub note: Option<String>,
    /// The state the client last saw; a mismatch is a 409.
    pub expected_status: Option<ReviewStatus>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Catalog reads
// ---------------------------------------------------------------------------

/// GET /api/v1/projects
pub async fn list_projects(
    current: CurrentViewer,
    State(state): State<AppState>,
    Query(params): Query<ProjectListQuery>,
) -> AppResult<Json<DataResponse<Vec<ProjectView>>>> {
    let filter = params.into_filter()?;
    let projects = catalog::list_visible_projects(&state.pool, &current.viewer, filter).await?;
    Ok(Json(DataResponse::new(projects)))
}

/// GET /api/v1/projects/review-queue
///
/// Pending submissions, for lecturers and admins.
pub async fn review_queue(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Query(params): Query<ProjectListQuery>,
) -> AppResult<Json<DataResponse<Vec<ProjectView>>>> {
    let filter = CatalogFilter {
        review_status: Some(ReviewStatus::Pending),
        ..params.into_filter()?
    };
    let projects = catalog::list_visible_projects(&state.pool, &user.viewer(), filter).await?;
    Ok(Json(DataResponse::new(projects)))
}

/// GET /api/v1/projects/{id}
pub async fn get_project(
    current: CurrentViewer,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectView>>> {
    let project = catalog::get_project_if_visible(&state.pool, id, &current.viewer).await?;
    let view = catalog::view(&state.pool, project, &current.viewer).await?;
    Ok(Json(DataResponse::new(view)))
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// POST /api/v1/projects
pub async fn create_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(draft): Json<ProjectDraft>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectView>>)> {
    let viewer = auth.viewer();
    let project = catalog::create_project(&state.pool, &viewer, draft).await?;
    let view = catalog::view(&state.pool, project, &viewer).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(view))))
}

/// PUT /api/v1/projects/{id}
pub async fn update_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(draft): Json<ProjectDraft>,
) -> AppResult<Json<DataResponse<ProjectView>>> {
    let viewer = auth.viewer();
    let project = catalog::update_project(&state.pool, id, &viewer, draft).await?;
    let view = catalog::view(&state.pool, project, &viewer).await?;
    Ok(Json(DataResponse::new(view)))
}

/// DELETE /api/v1/projects/{id}
pub async fn delete_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    catalog::delete_project(&state.pool, id, &auth.viewer()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Review transitions
// ---------------------------------------------------------------------------

/// POST /api/v1/projects/{id}/approve
pub async fn approve_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<ReviewRequest>>,
) -> AppResult<Json<DataResponse<ProjectView>>> {
    transition(&state, auth, id, Transition::Approve, body).await
}

/// POST /api/v1/projects/{id}/reject
pub async fn reject_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<ReviewRequest>>,
) -> AppResult<Json<DataResponse<ProjectView>>> {
    transition(&state, auth, id, Transition::Reject, body).await
}

/// POST /api/v1/projects/{id}/resubmit
pub async fn resubmit_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<ReviewRequest>>,
) -> AppResult<Json<DataResponse<ProjectView>>> {
    transition(&state, auth, id, Transition::Resubmit, body).await
}

async fn transition(
    state: &AppState,
    auth: AuthUser,
    id: DbId,
    transition: Transition,
    body: Option<Json<ReviewRequest>>,
) -> AppResult<Json<DataResponse<ProjectView>>> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let viewer = auth.viewer();
    let project = catalog::apply_transition(
        state,
        id,
        &viewer,
        transition,
        request.note.as_deref(),
        request.expected_status,
    )
    .await?;
    let view = catalog::view(&state.pool, project, &viewer).await?;
    Ok(Json(DataResponse::new(view)))
}

// ---------------------------------------------------------------------------
// Endorsements
// ---------------------------------------------------------------------------

/// POST /api/v1/projects/{id}/endorse
pub async fn endorse_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<EndorsementState>>> {
    let result = catalog::set_endorsement(&state.pool, id, &auth.viewer(), true).await?;
    Ok(Json(DataResponse::new(result)))
}

/// DELETE /api/v1/projects/{id}/endorse
pub async fn withdraw_endorsement(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<EndorsementState>>> {
    let result = catalog::set_endorsement(&state.pool, id, &auth.viewer(), false).await?;
    Ok(Json(DataResponse::new(result)))
}
