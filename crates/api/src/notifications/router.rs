//! Event-to-notification routing.
//!
//! Runs apart from the request that caused the event: a failed insert is
//! logged and dropped, and never undoes the transition that triggered it.

use karyakita_db::models::notification::CreateNotification;
use karyakita_db::repositories::NotificationRepo;
use karyakita_db::DbPool;
use karyakita_events::ReviewEvent;
use tokio::sync::broadcast;

pub struct NotificationRouter {
    pool: DbPool,
}

impl NotificationRouter {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Consume review events until the [`EventBus`](karyakita_events::EventBus)
    /// is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<ReviewEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.deliver(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = event.event_type(),
                            project_id = event.project_id,
                            "Failed to store notification"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Store the notification for a single event.
    pub async fn deliver(&self, event: &ReviewEvent) -> Result<(), sqlx::Error> {
        let notification = notification_for(event);
        let id = NotificationRepo::create(&self.pool, &notification).await?;
        tracing::debug!(
            notification_id = id,
            user_id = event.recipient_id,
            kind = %notification.kind,
            "Notification stored"
        );
        Ok(())
    }
}

/// Render the owner-facing notification for an event.
pub fn notification_for(event: &ReviewEvent) -> CreateNotification {
    CreateNotification {
        user_id: event.recipient_id,
        project_id: Some(event.project_id),
        kind: event.notice.kind().to_string(),
        title: event.notice.title().to_string(),
        message: event
            .notice
            .message(&event.project_title, event.note.as_deref()),
    }
}
