//! Sessions: opaque bearer tokens, stored only as their SHA-256 digest.

use karyakita_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// One issued token. Guest sessions have no `user_id`.
#[derive(Debug, Clone, FromRow)]
pub struct UserSession {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub token_hash: String,
    pub is_guest: bool,
    pub expires_at: Timestamp,
    pub is_revoked: bool,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// What an `Authorization` header resolves to: the live session plus,
/// for registered accounts, the role and active flag of its owner.
#[derive(Debug, Clone, FromRow)]
pub struct SessionIdentity {
    pub session_id: DbId,
    pub user_id: Option<DbId>,
    pub is_guest: bool,
    pub expires_at: Timestamp,
    pub role_name: Option<String>,
    pub is_active: Option<bool>,
}

pub struct CreateSession {
    /// `None` issues a guest session.
    pub user_id: Option<DbId>,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}
