//! Project entity model and DTOs.

use chrono::NaiveDate;
use karyakita_core::project::{ProgressStatus, ProjectContent};
use karyakita_core::review::{NoteUpdate, ReviewChange, ReviewStatus};
use karyakita_core::types::{DbId, Timestamp};
use karyakita_core::visibility::ProjectFacts;
use serde::Serialize;
use sqlx::FromRow;

/// A project row joined with its owner's name and ordered tags.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub owner_id: DbId,
    pub owner_name: String,
    pub title: String,
    pub summary: String,
    pub department: String,
    pub category: String,
    pub tags: Vec<String>,
    pub demo_link: Option<String>,
    pub thumbnail: String,
    pub completion_date: Option<NaiveDate>,
    pub year: Option<i32>,
    #[sqlx(try_from = "String")]
    pub progress: ProgressStatus,
    #[sqlx(rename = "review_status_id", try_from = "i16")]
    pub review_status: ReviewStatus,
    /// Cleared by the catalog before a project is shown to someone who may
    /// not read it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,
    pub published_at: Option<Timestamp>,
    pub endorsements: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    /// The fields visibility decisions depend on.
    pub fn facts(&self) -> ProjectFacts {
        ProjectFacts {
            owner_id: self.owner_id,
            status: self.review_status,
        }
    }
}

/// DTO for inserting a project. Content is already validated.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub owner_id: DbId,
    pub content: ProjectContent,
    pub review_status: ReviewStatus,
    pub published_at: Option<Timestamp>,
}

/// Review fields written by a compare-and-set transition.
#[derive(Debug, Clone)]
pub struct ReviewPatch {
    pub review_status: ReviewStatus,
    /// `None` leaves the stored notes untouched.
    pub review_notes: Option<String>,
    pub published_at: Option<Timestamp>,
}

impl From<&ReviewChange> for ReviewPatch {
    fn from(change: &ReviewChange) -> Self {
        Self {
            review_status: change.to,
            review_notes: match &change.review_notes {
                NoteUpdate::Keep => None,
                NoteUpdate::Replace(note) => Some(note.clone()),
            },
            published_at: change.published_at,
        }
    }
}

/// Catalog listing filter.
///
/// `visible_to` restricts results to rows a viewer may see: published rows,
/// plus the viewer's own rows. Staff pass `include_unpublished = true`.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    /// Case-insensitive match on title, summary, owner name or tag.
    pub search: Option<String>,
    pub department: Option<String>,
    pub category: Option<String>,
    pub year: Option<i32>,
    pub review_status: Option<ReviewStatus>,
    pub owner_id: Option<DbId>,
    pub visible_to: Option<DbId>,
    pub include_unpublished: bool,
    pub limit: i64,
    pub offset: i64,
}
