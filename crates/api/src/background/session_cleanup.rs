//! Periodic purge of expired and revoked sessions.

use std::time::Duration;

use karyakita_db::repositories::SessionRepo;
use karyakita_db::DbPool;
use tokio_util::sync::CancellationToken;

/// Run the session cleanup loop until `cancel` is triggered.
///
/// The first sweep runs immediately so a restart clears any backlog.
pub async fn run(pool: DbPool, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Session cleanup job started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match SessionRepo::cleanup_expired(&pool).await {
                    Ok(0) => tracing::debug!("Session cleanup: nothing to purge"),
                    Ok(deleted) => tracing::info!(deleted, "Session cleanup: purged sessions"),
                    Err(e) => tracing::error!(error = %e, "Session cleanup failed"),
                }
            }
        }
    }
}
