//! Handlers for the `/auth` resource (register, login, guest, logout, session).

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use karyakita_core::account::{
    parse_identifier, LoginIdentifier, NewAccount, LOCKOUT_DURATION_MINS, MAX_FAILED_LOGINS,
};
use karyakita_core::error::CoreError;
use karyakita_core::review::ReviewStatus;
use karyakita_core::roles::{Role, ROLE_STUDENT};
use karyakita_core::types::{DbId, Timestamp};
use karyakita_db::models::user::{CreateUser, User, UserResponse, UserStats};
use karyakita_db::repositories::{RoleRepo, SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{issue_session, ClientInfo};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentViewer;
use crate::response::DataResponse;
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email/NIM or password";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Campus email or NIM.
    pub identifier: String,
    pub password: String,
}

/// An account with its live profile statistics.
#[derive(Debug, Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: UserResponse,
    pub stats: UserStats,
}

/// Returned by register, login and guest.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: Timestamp,
    pub is_guest: bool,
    pub role: Role,
    pub user: Option<Profile>,
}

/// Returned by `GET /auth/session`.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub is_guest: bool,
    pub role: Role,
    pub user: Option<Profile>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create a student account and sign it in.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<NewAccount>,
) -> AppResult<(StatusCode, Json<DataResponse<SessionResponse>>)> {
    let account = input.validate_for(
        &state.config.allowed_email_domain,
        state.config.min_password_length,
    )?;

    let role = RoleRepo::find_by_name(&state.pool, ROLE_STUDENT)
        .await?
        .ok_or_else(|| AppError::InternalError("Student role is not seeded".into()))?;

    let password_hash = hash_password(&account.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            name: account.name,
            nim: account.nim,
            email: account.email,
            password_hash,
            department: account.department,
            role_id: role.id,
            is_verified: false,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "Account registered");

    let session = issue_session(&state, Some(user.id), ClientInfo::from_headers(&headers)).await?;
    let profile = load_profile(&state, &user, ROLE_STUDENT).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(SessionResponse {
            token: session.token,
            expires_at: session.expires_at,
            is_guest: false,
            role: Role::Student,
            user: Some(profile),
        })),
    ))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email or NIM plus password.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<SessionResponse>>> {
    let user = match parse_identifier(&input.identifier)? {
        LoginIdentifier::Email(email) => UserRepo::find_by_email(&state.pool, &email).await?,
        LoginIdentifier::Nim(nim) => UserRepo::find_by_nim(&state.pool, &nim).await?,
    }
    .ok_or_else(|| AppError::Core(CoreError::Unauthorized(INVALID_CREDENTIALS.into())))?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    if user.locked_until.is_some_and(|until| until > Utc::now()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is temporarily locked. Try again later.".into(),
        )));
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        let failures = UserRepo::increment_failed_login(&state.pool, user.id).await?;
        if failures >= MAX_FAILED_LOGINS {
            let lock_until = Utc::now() + chrono::Duration::minutes(LOCKOUT_DURATION_MINS);
            UserRepo::lock_account(&state.pool, user.id, lock_until).await?;
            tracing::warn!(user_id = user.id, failures, "Account locked after failed logins");
        }
        return Err(AppError::Core(CoreError::Unauthorized(
            INVALID_CREDENTIALS.into(),
        )));
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;

    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    let role = Role::from_name(&role_name)
        .ok_or_else(|| AppError::InternalError(format!("Unknown role '{role_name}'")))?;

    let session = issue_session(&state, Some(user.id), ClientInfo::from_headers(&headers)).await?;
    let profile = load_profile(&state, &user, &role_name).await?;

    tracing::info!(user_id = user.id, role = %role, "Signed in");

    Ok(Json(DataResponse::new(SessionResponse {
        token: session.token,
        expires_at: session.expires_at,
        is_guest: false,
        role,
        user: Some(profile),
    })))
}

/// POST /api/v1/auth/guest
///
/// Start a read-only guest session.
pub async fn guest(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<(StatusCode, Json<DataResponse<SessionResponse>>)> {
    let session = issue_session(&state, None, ClientInfo::from_headers(&headers)).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(SessionResponse {
            token: session.token,
            expires_at: session.expires_at,
            is_guest: true,
            role: Role::Guest,
            user: None,
        })),
    ))
}

/// POST /api/v1/auth/logout
///
/// Revoke the session that made this request. Returns 204 No Content.
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentViewer,
) -> AppResult<StatusCode> {
    let session_id = require_session(&current)?;
    SessionRepo::revoke(&state.pool, session_id).await?;
    tracing::debug!(session_id, "Session revoked");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/session
///
/// Describe the current session, with the account profile when signed in.
pub async fn session(
    State(state): State<AppState>,
    current: CurrentViewer,
) -> AppResult<Json<DataResponse<SessionInfo>>> {
    require_session(&current)?;
    let viewer = current.viewer;

    let user = match viewer.id.filter(|_| !viewer.is_guest()) {
        Some(user_id) => {
            let user = UserRepo::find_by_id(&state.pool, user_id)
                .await?
                .ok_or_else(|| {
                    AppError::Core(CoreError::Unauthorized("Account no longer exists".into()))
                })?;
            Some(load_profile(&state, &user, viewer.role.as_str()).await?)
        }
        None => None,
    };

    Ok(Json(DataResponse::new(SessionInfo {
        is_guest: viewer.is_guest(),
        role: viewer.role,
        user,
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn require_session(current: &CurrentViewer) -> AppResult<DbId> {
    current
        .session_id
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("No active session".into())))
}

async fn load_profile(state: &AppState, user: &User, role: &str) -> AppResult<Profile> {
    let stats = UserRepo::stats(&state.pool, user.id, ReviewStatus::Published.id()).await?;
    Ok(Profile {
        user: UserResponse::from_user(user, role),
        stats,
    })
}
