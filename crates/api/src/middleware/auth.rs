//! Session-token extractors for Axum handlers.
//!
//! [`CurrentViewer`] never rejects a request that carries no token: it
//! resolves to an anonymous guest. A token that is present but malformed,
//! revoked or expired is always a 401, so clients learn to re-authenticate
//! instead of silently seeing less. [`AuthUser`] additionally requires a
//! registered account.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use karyakita_core::error::CoreError;
use karyakita_core::roles::Role;
use karyakita_core::sessions::{hash_session_token, looks_like_session_token};
use karyakita_core::types::DbId;
use karyakita_core::visibility::Viewer;
use karyakita_db::repositories::SessionRepo;

use crate::error::AppError;
use crate::state::AppState;

const INVALID_SESSION: &str = "Invalid or expired session";

/// Whoever is making the request, registered or not.
#[derive(Debug, Clone, Copy)]
pub struct CurrentViewer {
    pub viewer: Viewer,
    /// `None` when no token was sent.
    pub session_id: Option<DbId>,
}

impl CurrentViewer {
    fn anonymous() -> Self {
        Self {
            viewer: Viewer::guest(),
            session_id: None,
        }
    }
}

impl FromRequestParts<AppState> for CurrentViewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts.headers.get("authorization") else {
            return Ok(CurrentViewer::anonymous());
        };

        let token = auth_header
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Invalid Authorization format. Expected: Bearer <token>".into(),
                ))
            })?;

        if !looks_like_session_token(token) {
            return Err(AppError::Core(CoreError::Unauthorized(INVALID_SESSION.into())));
        }

        let identity = SessionRepo::find_active_by_token_hash(&state.pool, &hash_session_token(token))
            .await?
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized(INVALID_SESSION.into())))?;

        if identity.is_guest {
            return Ok(CurrentViewer {
                viewer: Viewer::guest(),
                session_id: Some(identity.session_id),
            });
        }

        if identity.is_active == Some(false) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Account is deactivated".into(),
            )));
        }

        let role = identity.role_name.as_deref().and_then(Role::from_name);
        let (Some(user_id), Some(role)) = (identity.user_id, role) else {
            tracing::warn!(
                session_id = identity.session_id,
                role = ?identity.role_name,
                "Session resolved to an account without a known role"
            );
            return Err(AppError::Core(CoreError::Unauthorized(INVALID_SESSION.into())));
        };

        Ok(CurrentViewer {
            viewer: Viewer::account(user_id, role),
            session_id: Some(identity.session_id),
        })
    }
}

/// A registered account with a valid session.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: DbId,
    pub role: Role,
    pub session_id: DbId,
}

impl AuthUser {
    pub fn viewer(&self) -> Viewer {
        Viewer::account(self.user_id, self.role)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentViewer::from_request_parts(parts, state).await?;
        match (current.viewer.id, current.session_id) {
            (Some(user_id), Some(session_id)) if !current.viewer.is_guest() => Ok(AuthUser {
                user_id,
                role: current.viewer.role,
                session_id,
            }),
            (_, None) => Err(AppError::Core(CoreError::Unauthorized(
                "Sign in to continue".into(),
            ))),
            _ => Err(AppError::Core(CoreError::Forbidden(
                "Guest sessions cannot perform this action; sign in with a campus account".into(),
            ))),
        }
    }
}
