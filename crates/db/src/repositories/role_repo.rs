//! The `roles` lookup table. Its rows come from the initial migration and are
//! never written at runtime.

use karyakita_core::types::DbId;
use sqlx::PgPool;

use crate::models::role::RoleRow;

pub struct RoleRepo;

impl RoleRepo {
    /// Look a role up by its stored name: `student`, `lecturer` or `admin`.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<RoleRow>, sqlx::Error> {
        sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description, created_at, updated_at FROM roles WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// Name behind `role_id`; `"unknown"` for a dangling reference.
    pub async fn resolve_name(pool: &PgPool, role_id: DbId) -> Result<String, sqlx::Error> {
        let name: Option<String> = sqlx::query_scalar("SELECT name FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_optional(pool)
            .await?;
        Ok(name.unwrap_or_else(|| "unknown".into()))
    }
}
