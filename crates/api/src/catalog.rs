//! Catalog service: the only path by which projects are read or change state.
//!
//! Every read runs the visibility policy from `karyakita_core::visibility`
//! against the row actually loaded, so list and detail responses always
//! agree. A project the viewer may not see is reported exactly like a
//! project that does not exist. Review transitions are planned by
//! `karyakita_core::review::plan_transition` and persisted with a
//! compare-and-set write keyed on the state the plan was made against.

use std::collections::HashSet;

use chrono::Utc;
use karyakita_core::error::CoreError;
use karyakita_core::project::ProjectDraft;
use karyakita_core::review::{initial_status, plan_transition, ReviewStatus, Transition};
use karyakita_core::types::DbId;
use karyakita_core::visibility::{
    available_actions, can_delete, can_edit_content, can_endorse, can_see_review_notes,
    is_visible, ProjectAction, Viewer,
};
use karyakita_db::models::project::{CreateProject, Project, ProjectFilter, ReviewPatch};
use karyakita_db::repositories::ProjectRepo;
use karyakita_db::DbPool;
use karyakita_events::ReviewEvent;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// A project as shown to one particular viewer.
#[derive(Debug, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub endorsed_by_me: bool,
    pub actions: Vec<ProjectAction>,
}

impl ProjectView {
    /// Strip fields the viewer may not read and attach the offered actions.
    pub fn new(mut project: Project, viewer: &Viewer, endorsed_by_me: bool) -> Self {
        let facts = project.facts();
        if !can_see_review_notes(facts, viewer) {
            project.review_notes = None;
        }
        Self {
            actions: available_actions(facts, viewer),
            endorsed_by_me,
            project,
        }
    }
}

/// Listing criteria after query-string parsing.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub search: Option<String>,
    pub department: Option<String>,
    pub category: Option<String>,
    pub year: Option<i32>,
    pub review_status: Option<ReviewStatus>,
    /// Restrict to the viewer's own projects.
    pub mine: bool,
    pub limit: i64,
    pub offset: i64,
}

/// Projects `viewer` may see, newest first.
pub async fn list_visible_projects(
    pool: &DbPool,
    viewer: &Viewer,
    filter: CatalogFilter,
) -> AppResult<Vec<ProjectView>> {
    let owner_id = if filter.mine {
        match viewer.id.filter(|_| !viewer.is_guest()) {
            Some(id) => Some(id),
            None => {
                return Err(AppError::Core(CoreError::Forbidden(
                    "Sign in to list your own projects".into(),
                )))
            }
        }
    } else {
        None
    };

    let db_filter = ProjectFilter {
        search: filter.search,
        department: filter.department,
        category: filter.category,
        year: filter.year,
        review_status: filter.review_status,
        owner_id,
        visible_to: viewer.id.filter(|_| !viewer.is_guest()),
        include_unpublished: viewer.is_staff(),
        limit: filter.limit,
        offset: filter.offset,
    };

    let projects: Vec<Project> = ProjectRepo::list(pool, &db_filter)
        .await?
        .into_iter()
        .filter(|p| is_visible(p.facts(), viewer))
        .collect();

    tracing::debug!(count = projects.len(), role = %viewer.role, "Listed projects");
    views(pool, projects, viewer).await
}

/// Load a project, treating "hidden from this viewer" as "not found".
pub async fn get_project_if_visible(pool: &DbPool, id: DbId, viewer: &Viewer) -> AppResult<Project> {
    match ProjectRepo::find_by_id(pool, id).await? {
        Some(project) if is_visible(project.facts(), viewer) => Ok(project),
        _ => Err(not_found(id)),
    }
}

/// Build the viewer-specific representation of a single project.
pub async fn view(pool: &DbPool, project: Project, viewer: &Viewer) -> AppResult<ProjectView> {
    let mut views = views(pool, vec![project], viewer).await?;
    views
        .pop()
        .ok_or_else(|| AppError::InternalError("Project view was not built".into()))
}

async fn views(pool: &DbPool, projects: Vec<Project>, viewer: &Viewer) -> AppResult<Vec<ProjectView>> {
    let endorsed: HashSet<DbId> = match viewer.id.filter(|_| !viewer.is_guest()) {
        Some(user_id) if !projects.is_empty() => {
            let ids: Vec<DbId> = projects.iter().map(|p| p.id).collect();
            ProjectRepo::endorsed_by(pool, user_id, &ids)
                .await?
                .into_iter()
                .collect()
        }
        _ => HashSet::new(),
    };

    Ok(projects
        .into_iter()
        .map(|p| {
            let endorsed_by_me = endorsed.contains(&p.id);
            ProjectView::new(p, viewer, endorsed_by_me)
        })
        .collect())
}

/// Apply a review transition on behalf of `viewer`.
///
/// `expected`, when given, is the state the client last saw; the request
/// fails with a conflict if the project has moved on since.
pub async fn apply_transition(
    state: &AppState,
    id: DbId,
    viewer: &Viewer,
    transition: Transition,
    note: Option<&str>,
    expected: Option<ReviewStatus>,
) -> AppResult<Project> {
    let project = get_project_if_visible(&state.pool, id, viewer).await?;

    let change = plan_transition(
        transition,
        project.review_status,
        viewer.role,
        viewer.owns(project.owner_id),
        note,
        Utc::now(),
    )?;

    if let Some(expected) = expected {
        if expected != project.review_status {
            return Err(stale_state(id, project.review_status));
        }
    }

    let Some(updated) =
        ProjectRepo::update_review(&state.pool, id, change.from, &ReviewPatch::from(&change))
            .await?
    else {
        // Lost a race: someone else changed or deleted the project.
        return match ProjectRepo::find_by_id(&state.pool, id).await? {
            Some(current) => Err(stale_state(id, current.review_status)),
            None => Err(not_found(id)),
        };
    };

    tracing::info!(
        project_id = id,
        user_id = ?viewer.id,
        transition = %transition,
        from = %change.from,
        to = %change.to,
        "Review transition applied"
    );

    state.event_bus.publish(ReviewEvent::from_change(
        &change,
        updated.id,
        updated.title.clone(),
        updated.owner_id,
        viewer.id,
    ));

    Ok(updated)
}

/// Submit a new project owned by `owner`.
///
/// Lecturer submissions are published immediately; everything else waits in
/// the review queue.
pub async fn create_project(pool: &DbPool, owner: &Viewer, draft: ProjectDraft) -> AppResult<Project> {
    let owner_id = owner
        .id
        .filter(|_| !owner.is_guest())
        .ok_or_else(|| AppError::Core(CoreError::Forbidden("Sign in to submit a project".into())))?;

    let content = draft.into_content()?;
    let review_status = initial_status(owner.role);
    let published_at = (review_status == ReviewStatus::Published).then(Utc::now);

    let project = ProjectRepo::create(
        pool,
        &CreateProject {
            owner_id,
            content,
            review_status,
            published_at,
        },
    )
    .await?;

    tracing::info!(
        project_id = project.id,
        user_id = owner_id,
        status = %project.review_status,
        "Project created"
    );
    Ok(project)
}

/// Replace a project's content.
///
/// The write is conditional on the review state the permission check saw, so
/// a project approved mid-edit is not silently changed under its approval.
pub async fn update_project(
    pool: &DbPool,
    id: DbId,
    viewer: &Viewer,
    draft: ProjectDraft,
) -> AppResult<Project> {
    let project = get_project_if_visible(pool, id, viewer).await?;

    if !can_edit_content(project.facts(), viewer) {
        return Err(AppError::Core(CoreError::Forbidden(
            if viewer.owns(project.owner_id) {
                "Published projects can only be edited after a reviewer returns them".into()
            } else {
                "Only the project owner can edit it".into()
            },
        )));
    }

    let content = draft.into_content()?;

    match ProjectRepo::update_content(pool, id, project.review_status, &content).await? {
        Some(updated) => {
            tracing::info!(project_id = id, user_id = ?viewer.id, "Project content updated");
            Ok(updated)
        }
        None => match ProjectRepo::find_by_id(pool, id).await? {
            Some(current) => Err(stale_state(id, current.review_status)),
            None => Err(not_found(id)),
        },
    }
}

pub async fn delete_project(pool: &DbPool, id: DbId, viewer: &Viewer) -> AppResult<()> {
    let project = get_project_if_visible(pool, id, viewer).await?;

    if !can_delete(project.facts(), viewer) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the project owner can delete it".into(),
        )));
    }

    if !ProjectRepo::delete(pool, id).await? {
        return Err(not_found(id));
    }
    tracing::info!(project_id = id, user_id = ?viewer.id, "Project deleted");
    Ok(())
}

/// Result of an endorsement change, as returned to the client.
#[derive(Debug, Serialize)]
pub struct EndorsementState {
    pub project_id: DbId,
    pub endorsements: i32,
    pub endorsed_by_me: bool,
}

/// Endorse (`endorse = true`) or withdraw an endorsement. Both are idempotent.
pub async fn set_endorsement(
    pool: &DbPool,
    id: DbId,
    viewer: &Viewer,
    endorse: bool,
) -> AppResult<EndorsementState> {
    let project = get_project_if_visible(pool, id, viewer).await?;
    let user_id = viewer
        .id
        .filter(|_| !viewer.is_guest())
        .ok_or_else(|| AppError::Core(CoreError::Forbidden("Sign in to endorse projects".into())))?;

    let outcome = if endorse {
        if !can_endorse(project.facts(), viewer) {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Only published projects can be endorsed; this one is {}",
                project.review_status
            ))));
        }
        ProjectRepo::endorse(pool, id, user_id).await?
    } else {
        ProjectRepo::unendorse(pool, id, user_id).await?
    }
    // Deleted after the visibility check.
    .ok_or_else(|| not_found(id))?;

    if outcome.changed {
        tracing::info!(project_id = id, user_id, endorse, "Endorsement changed");
    }

    Ok(EndorsementState {
        project_id: id,
        endorsements: outcome.endorsements,
        endorsed_by_me: endorse,
    })
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Project",
        id,
    })
}

fn stale_state(id: DbId, current: ReviewStatus) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "Project {id} is now {current}; reload it and try again"
    )))
}
