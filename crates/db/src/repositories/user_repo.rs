//! Repository for the `users` table.

use karyakita_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::status::StatusId;
use crate::models::user::{CreateUser, User, UserStats};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, nim, email, password_hash, department, role_id, is_verified, \
                       avatar_color, is_active, last_login_at, failed_login_count, locked_until, \
                       created_at, updated_at";

/// Provides account persistence and login bookkeeping.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    ///
    /// Fails with a unique violation on `uq_users_nim` / `uq_users_email`
    /// when the NIM or email is already registered.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, nim, email, password_hash, department, role_id, is_verified)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.nim)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.department)
            .bind(input.role_id)
            .bind(input.is_verified)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by normalized (lowercase) email.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by normalized NIM.
    pub async fn find_by_nim(pool: &PgPool, nim: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE nim = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(nim)
            .fetch_optional(pool)
            .await
    }

    /// Count one more failed login, returning the new count.
    ///
    /// A lock that has already run out starts a fresh streak: the counter
    /// restarts at 1 and `locked_until` is cleared.
    pub async fn increment_failed_login(pool: &PgPool, id: DbId) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE users SET
                failed_login_count = CASE
                    WHEN locked_until IS NOT NULL AND locked_until <= NOW() THEN 1
                    ELSE failed_login_count + 1
                END,
                locked_until = CASE
                    WHEN locked_until <= NOW() THEN NULL
                    ELSE locked_until
                END
             WHERE id = $1
             RETURNING failed_login_count",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Lock a user account until the specified timestamp.
    pub async fn lock_account(
        pool: &PgPool,
        id: DbId,
        until: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET locked_until = $2 WHERE id = $1")
            .bind(id)
            .bind(until)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record a successful login: reset `failed_login_count` to 0, clear `locked_until`,
    /// and set `last_login_at` to now.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET
                failed_login_count = 0,
                locked_until = NULL,
                last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Profile aggregates: project count, endorsements received across all
    /// projects, and the title of the most-endorsed published project.
    pub async fn stats(
        pool: &PgPool,
        id: DbId,
        published_status: StatusId,
    ) -> Result<UserStats, sqlx::Error> {
        sqlx::query_as::<_, UserStats>(
            "SELECT
                COUNT(*) AS total_projects,
                COALESCE(SUM(endorsements), 0)::BIGINT AS total_endorsements,
                (SELECT title FROM projects
                  WHERE owner_id = $1 AND review_status_id = $2
                  ORDER BY endorsements DESC, published_at DESC
                  LIMIT 1) AS top_project_title
             FROM projects
             WHERE owner_id = $1",
        )
        .bind(id)
        .bind(published_status)
        .fetch_one(pool)
        .await
    }
}
