//! User entity model and DTOs.

use karyakita_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub nim: String,
    pub email: String,
    pub password_hash: String,
    pub department: String,
    pub role_id: DbId,
    pub is_verified: bool,
    pub avatar_color: String,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub name: String,
    pub nim: String,
    pub email: String,
    pub department: String,
    /// Resolved role name (e.g. `"lecturer"`).
    pub role: String,
    pub is_verified: bool,
    pub avatar_color: String,
    pub created_at: Timestamp,
}

impl UserResponse {
    pub fn from_user(user: &User, role: &str) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            nim: user.nim.clone(),
            email: user.email.clone(),
            department: user.department.clone(),
            role: role.to_string(),
            is_verified: user.is_verified,
            avatar_color: user.avatar_color.clone(),
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user. Fields are already normalized.
#[derive(Debug)]
pub struct CreateUser {
    pub name: String,
    pub nim: String,
    pub email: String,
    pub password_hash: String,
    pub department: String,
    pub role_id: DbId,
    pub is_verified: bool,
}

/// Aggregates shown on a user's profile.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct UserStats {
    pub total_projects: i64,
    pub total_endorsements: i64,
    /// Title of the owner's most-endorsed published project, if any.
    pub top_project_title: Option<String>,
}
