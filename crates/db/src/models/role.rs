//! Account roles as stored in the database.

use karyakita_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// `name` parses into `karyakita_core::roles::Role`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RoleRow {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
