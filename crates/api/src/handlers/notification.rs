//! Inbox endpoints. Notifications are produced by
//! [`crate::notifications::NotificationRouter`]; a registered account can only
//! read and acknowledge its own.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use karyakita_core::error::CoreError;
use karyakita_core::types::DbId;
use karyakita_db::models::notification::Notification;
use karyakita_db::repositories::NotificationRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::{clamp_limit, clamp_offset};
use crate::response::DataResponse;
use crate::state::AppState;

const INBOX_PAGE: i64 = 50;
const INBOX_PAGE_MAX: i64 = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InboxQuery {
    pub unread_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub marked_read: u64,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<InboxQuery>,
) -> AppResult<Json<DataResponse<Vec<Notification>>>> {
    let inbox = NotificationRepo::list_for_user(
        &state.pool,
        auth.user_id,
        query.unread_only,
        clamp_limit(query.limit, INBOX_PAGE, INBOX_PAGE_MAX),
        clamp_offset(query.offset),
    )
    .await?;
    Ok(Json(DataResponse::new(inbox)))
}

/// 204 on success; another account's notification is a 404.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if NotificationRepo::mark_read(&state.pool, id, auth.user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id,
        }))
    }
}

pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<MarkedRead>>> {
    let marked_read = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;
    tracing::debug!(user_id = auth.user_id, marked_read, "Inbox acknowledged");
    Ok(Json(DataResponse::new(MarkedRead { marked_read })))
}

pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UnreadCount>>> {
    let count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse::new(UnreadCount { count })))
}
