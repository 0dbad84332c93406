//! Password hashing and session issuance.

pub mod password;

use chrono::{Duration, Utc};
use karyakita_core::sessions::generate_session_token;
use karyakita_core::types::{DbId, Timestamp};
use karyakita_db::models::session::CreateSession;
use karyakita_db::repositories::SessionRepo;
use serde::Serialize;

use crate::error::AppResult;
use crate::state::AppState;

/// A session handed to the client. The token is shown exactly once.
#[derive(Debug, Serialize)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: Timestamp,
}

/// Client details recorded with a session.
#[derive(Debug, Default, Clone)]
pub struct ClientInfo {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl ClientInfo {
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            user_agent: header("user-agent"),
            ip_address: header("x-forwarded-for")
                .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string())),
        }
    }
}

/// Create a session for `user_id`, or a guest session when `None`.
pub async fn issue_session(
    state: &AppState,
    user_id: Option<DbId>,
    client: ClientInfo,
) -> AppResult<IssuedSession> {
    let token = generate_session_token();
    let expires_at = Utc::now() + Duration::minutes(state.config.session_ttl_minutes);

    let session = SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id,
            token_hash: token.hash,
            expires_at,
            user_agent: client.user_agent,
            ip_address: client.ip_address,
        },
    )
    .await?;

    tracing::debug!(session_id = session.id, user_id = ?user_id, "Session issued");

    Ok(IssuedSession {
        token: token.plaintext,
        expires_at: session.expires_at,
    })
}
