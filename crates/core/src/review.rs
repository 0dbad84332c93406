//! Project review state machine.
//!
//! A project is always in exactly one of three review states. Lecturers and
//! admins move it between `pending`, `published` and `rejected`; the owner
//! can only send a rejected project back to the queue.
//!
//! ```text
//!   pending ──approve──▶ published
//!      │  ▲                  │
//! reject  resubmit        reject
//!      ▼  │                  │
//!   rejected ◀───────────────┘
//!      │
//!      └──approve──▶ published
//! ```
//!
//! [`plan_transition`] is a pure decision: it validates actor, input and
//! current state, and returns the field changes to persist. Nothing here
//! touches storage, so an illegal transition is always detected before any
//! write is attempted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length for a lecturer's review note.
pub const MAX_REVIEW_NOTE_LENGTH: usize = 5_000;

/// Error message for a rejection without revision notes.
pub const MISSING_REJECTION_NOTE: &str =
    "Revision notes are mandatory so the owner knows what to fix";

// ---------------------------------------------------------------------------
// Review status
// ---------------------------------------------------------------------------

/// Review state of a project.
///
/// Discriminants match the seed order of the `review_statuses` lookup table.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending = 1,
    Published = 2,
    Rejected = 3,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 3] = [
        ReviewStatus::Pending,
        ReviewStatus::Published,
        ReviewStatus::Rejected,
    ];

    /// Return the database status ID.
    pub fn id(self) -> i16 {
        self as i16
    }

    /// Map a `review_statuses.id` back to the enum.
    pub fn from_id(id: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.id() == id)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Published => "published",
            ReviewStatus::Rejected => "rejected",
        }
    }

    /// Parse a status name as used in query strings.
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == name)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid review status '{name}'. Must be one of: pending, published, rejected"
                ))
            })
    }
}

impl TryFrom<i16> for ReviewStatus {
    type Error = CoreError;

    fn try_from(id: i16) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or_else(|| CoreError::Internal(format!("Unknown review status id {id}")))
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review state a new project starts in.
///
/// A lecturer's own submission bypasses review; everyone else's waits for one.
pub fn initial_status(creator: Role) -> ReviewStatus {
    match creator {
        Role::Lecturer => ReviewStatus::Published,
        Role::Admin | Role::Student | Role::Guest => ReviewStatus::Pending,
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// A review action that changes a project's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Approve,
    Reject,
    Resubmit,
}

impl Transition {
    pub const ALL: [Transition; 3] = [Transition::Approve, Transition::Reject, Transition::Resubmit];

    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Approve => "approve",
            Transition::Reject => "reject",
            Transition::Resubmit => "resubmit",
        }
    }

    /// States from which this transition may be taken.
    ///
    /// Approve is not offered on an already published project: there is
    /// nothing to approve, and a note-only change would silently refresh
    /// `published_at`.
    pub fn allowed_from(self) -> &'static [ReviewStatus] {
        match self {
            Transition::Approve => &[ReviewStatus::Pending, ReviewStatus::Rejected],
            Transition::Reject => &[ReviewStatus::Pending, ReviewStatus::Published],
            Transition::Resubmit => &[ReviewStatus::Rejected],
        }
    }

    pub fn target(self) -> ReviewStatus {
        match self {
            Transition::Approve => ReviewStatus::Published,
            Transition::Reject => ReviewStatus::Rejected,
            Transition::Resubmit => ReviewStatus::Pending,
        }
    }

    /// Whether an actor with `role` (owning the project or not) may trigger
    /// this transition, independent of the current state.
    pub fn permits(self, role: Role, is_owner: bool) -> bool {
        match self {
            Transition::Approve | Transition::Reject => role.is_staff(),
            Transition::Resubmit => is_owner && role == Role::Student,
        }
    }

    pub fn is_allowed_from(self, current: ReviewStatus) -> bool {
        self.allowed_from().contains(&current)
    }

    /// Notification sent to the owner after this transition succeeds.
    pub fn notice(self) -> ReviewNotice {
        match self {
            Transition::Approve => ReviewNotice::Approved,
            Transition::Reject => ReviewNotice::Rejected,
            Transition::Resubmit => ReviewNotice::ResubmitRequested,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to `review_notes` when a transition is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteUpdate {
    /// Leave the stored notes untouched.
    Keep,
    /// Overwrite the stored notes.
    Replace(String),
}

/// The validated outcome of a transition, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewChange {
    pub transition: Transition,
    /// State the write must still observe (compare-and-set precondition).
    pub from: ReviewStatus,
    pub to: ReviewStatus,
    pub review_notes: NoteUpdate,
    /// `Some` exactly when `to` is [`ReviewStatus::Published`].
    pub published_at: Option<Timestamp>,
}

/// Decide whether `transition` may be applied and compute its effect.
///
/// Checks run in a fixed order so callers get a stable error for a given
/// request: actor permission (`Forbidden`), then input (`Validation`), then
/// the current-state precondition (`Conflict`).
pub fn plan_transition(
    transition: Transition,
    current: ReviewStatus,
    actor: Role,
    is_owner: bool,
    note: Option<&str>,
    now: Timestamp,
) -> Result<ReviewChange, CoreError> {
    if !transition.permits(actor, is_owner) {
        return Err(CoreError::Forbidden(match transition {
            Transition::Resubmit => {
                "Only the student who owns the project can resubmit it for review".into()
            }
            _ => format!("Role '{actor}' cannot {transition} projects"),
        }));
    }

    let note = normalize_note(note)?;

    let review_notes = match (transition, note) {
        (Transition::Reject, None) => {
            return Err(CoreError::Validation(MISSING_REJECTION_NOTE.into()));
        }
        (Transition::Reject, Some(note)) | (Transition::Approve, Some(note)) => {
            NoteUpdate::Replace(note)
        }
        (Transition::Approve, None) | (Transition::Resubmit, _) => NoteUpdate::Keep,
    };

    if !transition.is_allowed_from(current) {
        return Err(CoreError::Conflict(format!(
            "Cannot {transition} a project that is {current}"
        )));
    }

    let to = transition.target();
    let published_at = (to == ReviewStatus::Published).then_some(now);

    Ok(ReviewChange {
        transition,
        from: current,
        to,
        review_notes,
        published_at,
    })
}

/// Trim a note; blank notes count as absent.
fn normalize_note(note: Option<&str>) -> Result<Option<String>, CoreError> {
    let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    if note.chars().count() > MAX_REVIEW_NOTE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Review note exceeds maximum length of {MAX_REVIEW_NOTE_LENGTH} characters"
        )));
    }
    Ok(Some(note.to_string()))
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

/// Kind of notification emitted to the owner after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewNotice {
    Approved,
    Rejected,
    ResubmitRequested,
}

impl ReviewNotice {
    /// Value stored in `notifications.kind`.
    pub fn kind(self) -> &'static str {
        match self {
            ReviewNotice::Approved => "approved",
            ReviewNotice::Rejected => "rejected",
            ReviewNotice::ResubmitRequested => "resubmit_requested",
        }
    }

    /// Dot-separated event name published on the event bus.
    pub fn event_type(self) -> &'static str {
        match self {
            ReviewNotice::Approved => "project.approved",
            ReviewNotice::Rejected => "project.rejected",
            ReviewNotice::ResubmitRequested => "project.resubmitted",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ReviewNotice::Approved => "Project published",
            ReviewNotice::Rejected => "Revision requested",
            ReviewNotice::ResubmitRequested => "Project resubmitted",
        }
    }

    /// Human-readable notification body for the owner.
    pub fn message(self, project_title: &str, note: Option<&str>) -> String {
        let base = match self {
            ReviewNotice::Approved => {
                format!("\"{project_title}\" was approved and is now visible in the catalog.")
            }
            ReviewNotice::Rejected => {
                format!("\"{project_title}\" was returned for revision.")
            }
            ReviewNotice::ResubmitRequested => {
                format!("\"{project_title}\" is back in the review queue.")
            }
        };
        match note.filter(|n| !n.is_empty()) {
            Some(note) => format!("{base} Reviewer notes: {note}"),
            None => base,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
