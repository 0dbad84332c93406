//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` in the application state.

use chrono::Utc;
use karyakita_core::review::{NoteUpdate, ReviewChange, ReviewNotice, ReviewStatus};
use karyakita_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// ReviewEvent
// ---------------------------------------------------------------------------

/// A project changed review state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub notice: ReviewNotice,
    pub project_id: DbId,
    pub project_title: String,
    /// The project owner; every review event notifies them.
    pub recipient_id: DbId,
    pub actor_id: Option<DbId>,
    pub from: ReviewStatus,
    pub to: ReviewStatus,
    /// The reviewer's note, when this transition wrote one.
    pub note: Option<String>,
    pub timestamp: Timestamp,
}

impl ReviewEvent {
    /// Build the event for an applied transition.
    pub fn from_change(
        change: &ReviewChange,
        project_id: DbId,
        project_title: impl Into<String>,
        owner_id: DbId,
        actor_id: Option<DbId>,
    ) -> Self {
        Self {
            notice: change.transition.notice(),
            project_id,
            project_title: project_title.into(),
            recipient_id: owner_id,
            actor_id,
            from: change.from,
            to: change.to,
            note: match &change.review_notes {
                NoteUpdate::Keep => None,
                NoteUpdate::Replace(note) => Some(note.clone()),
            },
            timestamp: Utc::now(),
        }
    }

    /// Dot-separated event name, e.g. `"project.approved"`.
    pub fn event_type(&self) -> &'static str {
        self.notice.event_type()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust,ignore
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
/// bus.publish(event);
/// ```
pub struct EventBus {
    sender: broadcast::Sender<ReviewEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Never fails: with zero subscribers the event is dropped.
    pub fn publish(&self, event: ReviewEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Review event published with no subscribers");
        }
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ReviewEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use karyakita_core::review::{plan_transition, Transition};
    use karyakita_core::roles::Role;

    use super::*;

    fn rejection() -> ReviewEvent {
        let change = plan_transition(
            Transition::Reject,
            ReviewStatus::Pending,
            Role::Lecturer,
            false,
            Some("Add unit tests"),
            Utc::now(),
        )
        .unwrap();
        ReviewEvent::from_change(&change, 42, "FoodWaste Detector", 7, Some(3))
    }

    #[test]
    fn rejection_event_carries_note_and_owner() {
        let event = rejection();
        assert_eq!(event.notice, ReviewNotice::Rejected);
        assert_eq!(event.event_type(), "project.rejected");
        assert_eq!(event.recipient_id, 7);
        assert_eq!(event.actor_id, Some(3));
        assert_eq!(event.note.as_deref(), Some("Add unit tests"));
        assert_eq!(event.to, ReviewStatus::Rejected);
    }

    #[test]
    fn resubmit_event_has_no_note() {
        let change = plan_transition(
            Transition::Resubmit,
            ReviewStatus::Rejected,
            Role::Student,
            true,
            Some("ignored"),
            Utc::now(),
        )
        .unwrap();
        let event = ReviewEvent::from_change(&change, 42, "FoodWaste Detector", 7, Some(7));
        assert_eq!(event.notice, ReviewNotice::ResubmitRequested);
        assert!(event.note.is_none());
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(rejection());

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(e1.project_id, 42);
        assert_eq!(e2.project_id, 42);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(rejection());
    }

    #[test]
    fn serializes_notice_in_snake_case() {
        let json = serde_json::to_value(rejection()).unwrap();
        assert_eq!(json["notice"], "rejected");
        assert_eq!(json["from"], "pending");
    }
}
