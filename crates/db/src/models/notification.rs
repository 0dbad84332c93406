//! Review notifications delivered to project owners.

use karyakita_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// One inbox entry. `kind` is `approved`, `rejected` or `resubmit_requested`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub project_id: Option<DbId>,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: DbId,
    pub project_id: Option<DbId>,
    pub kind: String,
    pub title: String,
    pub message: String,
}
