//! Persistence for review notifications.
//!
//! Rows are written by the notification router and only ever read or
//! acknowledged by their recipient; every read and update is scoped by
//! `user_id`.

use karyakita_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{CreateNotification, Notification};

const COLUMNS: &str =
    "id, user_id, project_id, kind, title, message, is_read, read_at, created_at";

pub struct NotificationRepo;

impl NotificationRepo {
    pub async fn create(pool: &PgPool, input: &CreateNotification) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notifications (user_id, project_id, kind, title, message)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(input.user_id)
        .bind(input.project_id)
        .bind(&input.kind)
        .bind(&input.title)
        .bind(&input.message)
        .fetch_one(pool)
        .await
    }

    /// A page of `user_id`'s inbox, newest first, optionally unread only.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications
             WHERE user_id = $1 AND (NOT $2 OR NOT is_read)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(unread_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Acknowledge one notification.
    ///
    /// `false` means no such notification in this user's inbox. Repeating the
    /// call is harmless and keeps the first `read_at`.
    pub async fn mark_read(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let matched = sqlx::query(
            "UPDATE notifications
             SET is_read = true, read_at = COALESCE(read_at, NOW())
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();
        Ok(matched == 1)
    }

    /// Acknowledge the whole inbox; returns how many were still unread.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        sqlx::query(
            "UPDATE notifications SET is_read = true, read_at = NOW()
             WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .execute(pool)
        .await
        .map(|done| done.rows_affected())
    }

    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
