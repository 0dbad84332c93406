//! Repository for the `projects` table and its `project_tags` /
//! `project_endorsements` children.
//!
//! Review state only ever changes through [`ProjectRepo::update_review`], a
//! single conditional `UPDATE` keyed on the state the caller last observed.
//! Two reviewers racing on the same project cannot both succeed: the loser
//! matches zero rows and gets `None` back.

use karyakita_core::project::ProjectContent;
use karyakita_core::review::ReviewStatus;
use karyakita_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::project::{CreateProject, Project, ProjectFilter, ReviewPatch};

/// Projected columns; expects `projects` aliased as `p` and `users` as `u`.
const COLUMNS: &str = "p.id, p.owner_id, u.name AS owner_name, p.title, p.summary, \
     p.department, p.category, \
     ARRAY(SELECT t.tag FROM project_tags t WHERE t.project_id = p.id ORDER BY t.position) AS tags, \
     p.demo_link, p.thumbnail, p.completion_date, p.year, p.progress, p.review_status_id, \
     p.review_notes, p.published_at, p.endorsements, p.created_at, p.updated_at";

/// Result of an endorse or withdraw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndorsementOutcome {
    /// `false` when the call was a no-op (already endorsed / not endorsed).
    pub changed: bool,
    pub endorsements: i32,
}

/// Provides persistence for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a project and its tags in one transaction.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let content = &input.content;
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO projects
                (owner_id, title, summary, department, category, demo_link, thumbnail,
                 completion_date, year, progress, review_status_id, published_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING id",
        )
        .bind(input.owner_id)
        .bind(&content.title)
        .bind(&content.summary)
        .bind(&content.department)
        .bind(&content.category)
        .bind(&content.demo_link)
        .bind(&content.thumbnail)
        .bind(content.completion_date)
        .bind(content.year)
        .bind(content.progress.as_str())
        .bind(input.review_status.id())
        .bind(input.published_at)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_tags(&mut tx, id, &content.tags).await?;

        let query = format!(
            "SELECT {COLUMNS} FROM projects p JOIN users u ON u.id = p.owner_id WHERE p.id = $1"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(project)
    }

    /// Find a project by ID regardless of review state.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects p JOIN users u ON u.id = p.owner_id WHERE p.id = $1"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List projects matching `filter`, newest first.
    ///
    /// Unless `include_unpublished` is set, only published rows and rows owned
    /// by `visible_to` are returned.
    pub async fn list(pool: &PgPool, filter: &ProjectFilter) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects p JOIN users u ON u.id = p.owner_id
             WHERE ($1::TEXT IS NULL
                    OR p.title ILIKE $1 OR p.summary ILIKE $1 OR u.name ILIKE $1
                    OR EXISTS (SELECT 1 FROM project_tags t
                               WHERE t.project_id = p.id AND t.tag ILIKE $1))
               AND ($2::TEXT IS NULL OR LOWER(p.department) = LOWER($2))
               AND ($3::TEXT IS NULL OR LOWER(p.category) = LOWER($3))
               AND ($4::INTEGER IS NULL OR p.year = $4)
               AND ($5::SMALLINT IS NULL OR p.review_status_id = $5)
               AND ($6::BIGINT IS NULL OR p.owner_id = $6)
               AND ($7 OR p.review_status_id = $8 OR p.owner_id = $9)
             ORDER BY COALESCE(p.published_at, p.created_at) DESC, p.id DESC
             LIMIT $10 OFFSET $11"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(filter.search.as_deref().map(like_pattern))
            .bind(&filter.department)
            .bind(&filter.category)
            .bind(filter.year)
            .bind(filter.review_status.map(ReviewStatus::id))
            .bind(filter.owner_id)
            .bind(filter.include_unpublished)
            .bind(ReviewStatus::Published.id())
            .bind(filter.visible_to)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await
    }

    /// Replace a project's content, provided it is still in `expected` state.
    ///
    /// Returns `None` if the project is gone or its state moved on.
    pub async fn update_content(
        pool: &PgPool,
        id: DbId,
        expected: ReviewStatus,
        content: &ProjectContent,
    ) -> Result<Option<Project>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let updated: Option<DbId> = sqlx::query_scalar(
            "UPDATE projects SET
                title = $3, summary = $4, department = $5, category = $6,
                demo_link = $7, thumbnail = $8, completion_date = $9, year = $10,
                progress = $11
             WHERE id = $1 AND review_status_id = $2
             RETURNING id",
        )
        .bind(id)
        .bind(expected.id())
        .bind(&content.title)
        .bind(&content.summary)
        .bind(&content.department)
        .bind(&content.category)
        .bind(&content.demo_link)
        .bind(&content.thumbnail)
        .bind(content.completion_date)
        .bind(content.year)
        .bind(content.progress.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            return Ok(None);
        }

        Self::replace_tags(&mut tx, id, &content.tags).await?;

        let query = format!(
            "SELECT {COLUMNS} FROM projects p JOIN users u ON u.id = p.owner_id WHERE p.id = $1"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(project))
    }

    /// Compare-and-set the review fields.
    ///
    /// The write only happens if the row is still in `expected` state. Returns
    /// `None` when no row matched; the caller re-reads to tell a missing
    /// project from a lost race.
    pub async fn update_review(
        pool: &PgPool,
        id: DbId,
        expected: ReviewStatus,
        patch: &ReviewPatch,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "WITH p AS (
                UPDATE projects SET
                    review_status_id = $3,
                    review_notes = COALESCE($4, review_notes),
                    published_at = $5
                WHERE id = $1 AND review_status_id = $2
                RETURNING *
             )
             SELECT {COLUMNS} FROM p JOIN users u ON u.id = p.owner_id"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(expected.id())
            .bind(patch.review_status.id())
            .bind(&patch.review_notes)
            .bind(patch.published_at)
            .fetch_optional(pool)
            .await
    }

    /// Hard-delete a project; tags and endorsements cascade.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record `user_id`'s endorsement. Idempotent per account.
    ///
    /// Returns `None` if the project no longer exists.
    pub async fn endorse(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Option<EndorsementOutcome>, sqlx::Error> {
        Self::change_endorsement(pool, project_id, user_id, true).await
    }

    /// Withdraw `user_id`'s endorsement. Idempotent per account.
    ///
    /// Returns `None` if the project no longer exists.
    pub async fn unendorse(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Option<EndorsementOutcome>, sqlx::Error> {
        Self::change_endorsement(pool, project_id, user_id, false).await
    }

    /// Locks the project row before touching its endorsements: concurrent
    /// endorsers apply their counter updates in turn, and a project deleted
    /// meanwhile yields `None` instead of a foreign-key violation.
    async fn change_endorsement(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
        endorse: bool,
    ) -> Result<Option<EndorsementOutcome>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current: Option<i32> =
            sqlx::query_scalar("SELECT endorsements FROM projects WHERE id = $1 FOR UPDATE")
                .bind(project_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(current) = current else {
            return Ok(None);
        };

        let statement = if endorse {
            "INSERT INTO project_endorsements (project_id, user_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING"
        } else {
            "DELETE FROM project_endorsements WHERE project_id = $1 AND user_id = $2"
        };
        let changed = sqlx::query(statement)
            .bind(project_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        let endorsements: i32 = if changed {
            let delta: i32 = if endorse { 1 } else { -1 };
            sqlx::query_scalar(
                "UPDATE projects SET endorsements = GREATEST(endorsements + $2, 0)
                 WHERE id = $1
                 RETURNING endorsements",
            )
            .bind(project_id)
            .bind(delta)
            .fetch_one(&mut *tx)
            .await?
        } else {
            current
        };

        tx.commit().await?;
        Ok(Some(EndorsementOutcome {
            changed,
            endorsements,
        }))
    }

    /// Which of `project_ids` `user_id` has endorsed.
    pub async fn endorsed_by(
        pool: &PgPool,
        user_id: DbId,
        project_ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT project_id FROM project_endorsements
             WHERE user_id = $1 AND project_id = ANY($2)",
        )
        .bind(user_id)
        .bind(project_ids)
        .fetch_all(pool)
        .await
    }

    async fn replace_tags(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
        tags: &[String],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM project_tags WHERE project_id = $1")
            .bind(project_id)
            .execute(&mut **tx)
            .await?;

        for (position, tag) in tags.iter().enumerate() {
            sqlx::query("INSERT INTO project_tags (project_id, tag, position) VALUES ($1, $2, $3)")
                .bind(project_id)
                .bind(tag)
                .bind(position as i32)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }
}

/// Wrap a search term for `ILIKE`, escaping its wildcards.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
