//! Who may see a project, which of its fields, and what they may do with it.
//!
//! All functions here are pure. Handlers call them after loading a project so
//! that list and detail responses agree on every decision, and clients receive
//! the offered actions instead of re-deriving policy.

use serde::Serialize;

use crate::review::{ReviewStatus, Transition};
use crate::roles::Role;
use crate::types::DbId;

/// The identity a request is evaluated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    /// `None` for anonymous requests and guest sessions.
    pub id: Option<DbId>,
    pub role: Role,
}

impl Viewer {
    pub fn guest() -> Self {
        Self {
            id: None,
            role: Role::Guest,
        }
    }

    pub fn account(id: DbId, role: Role) -> Self {
        Self { id: Some(id), role }
    }

    pub fn is_guest(&self) -> bool {
        self.id.is_none() || self.role == Role::Guest
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn owns(&self, owner_id: DbId) -> bool {
        !self.is_guest() && self.id == Some(owner_id)
    }
}

/// The two project facts every policy decision depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectFacts {
    pub owner_id: DbId,
    pub status: ReviewStatus,
}

/// Whether `viewer` may see the project at all.
pub fn is_visible(project: ProjectFacts, viewer: &Viewer) -> bool {
    if project.status == ReviewStatus::Published {
        return true;
    }
    if viewer.is_staff() {
        return true;
    }
    viewer.owns(project.owner_id)
}

/// Review notes are shown only to the owner and to staff.
pub fn can_see_review_notes(project: ProjectFacts, viewer: &Viewer) -> bool {
    viewer.is_staff() || viewer.owns(project.owner_id)
}

/// Whether `viewer` may edit the project's content.
///
/// Students may only edit while a project is pending or rejected, so a
/// published project cannot change under its approval. Staff owners may edit
/// their own projects in any state.
pub fn can_edit_content(project: ProjectFacts, viewer: &Viewer) -> bool {
    if !viewer.owns(project.owner_id) {
        return false;
    }
    viewer.is_staff() || project.status != ReviewStatus::Published
}

pub fn can_delete(project: ProjectFacts, viewer: &Viewer) -> bool {
    viewer.owns(project.owner_id)
}

pub fn can_endorse(project: ProjectFacts, viewer: &Viewer) -> bool {
    !viewer.is_guest() && project.status == ReviewStatus::Published
}

/// An action a client may offer for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectAction {
    Approve,
    Reject,
    Resubmit,
    Edit,
    Delete,
    Endorse,
}

impl From<Transition> for ProjectAction {
    fn from(transition: Transition) -> Self {
        match transition {
            Transition::Approve => ProjectAction::Approve,
            Transition::Reject => ProjectAction::Reject,
            Transition::Resubmit => ProjectAction::Resubmit,
        }
    }
}

/// Actions `viewer` may take on the project right now, in a stable order.
///
/// A transition is offered when both its actor rule and its state
/// precondition hold, so anything listed here would pass
/// [`crate::review::plan_transition`] given valid input.
pub fn available_actions(project: ProjectFacts, viewer: &Viewer) -> Vec<ProjectAction> {
    let is_owner = viewer.owns(project.owner_id);
    let mut actions: Vec<ProjectAction> = Transition::ALL
        .into_iter()
        .filter(|t| t.permits(viewer.role, is_owner) && t.is_allowed_from(project.status))
        .map(ProjectAction::from)
        .collect();

    if can_edit_content(project, viewer) {
        actions.push(ProjectAction::Edit);
    }
    if can_delete(project, viewer) {
        actions.push(ProjectAction::Delete);
    }
    if can_endorse(project, viewer) {
        actions.push(ProjectAction::Endorse);
    }
    actions
}
