#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use karyakita_api::auth::password::hash_password;
use karyakita_api::config::ServerConfig;
use karyakita_api::router::build_app_router;
use karyakita_api::state::AppState;
use karyakita_core::roles::Role;
use karyakita_db::models::user::{CreateUser, User};
use karyakita_db::repositories::{RoleRepo, UserRepo};
use karyakita_events::EventBus;

pub const TEST_PASSWORD: &str = "rahasia-kampus-123";

/// Build a test `ServerConfig` with the development defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        session_ttl_minutes: 120,
        allowed_email_domain: "kampus.ac.id".to_string(),
        min_password_length: 8,
        session_cleanup_interval_secs: 3600,
    }
}

/// Build the production router around `pool`.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_bus(pool).0
}

/// Like [`build_test_app`], also returning the event bus so tests can
/// subscribe before making requests.
pub fn build_test_app_with_bus(pool: PgPool) -> (Router, Arc<EventBus>) {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
    };
    (build_app_router(state, &config), event_bus)
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    app.oneshot(request).await.expect("request should complete")
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

/// POST without a body.
pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json_auth(app: Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert an account directly. Its email is `<local_part>@kampus.ac.id` and
/// its password is [`TEST_PASSWORD`].
pub async fn create_test_user(pool: &PgPool, local_part: &str, nim: &str, role: Role) -> User {
    let role_row = RoleRepo::find_by_name(pool, role.as_str())
        .await
        .unwrap()
        .expect("role should be seeded");
    UserRepo::create(
        pool,
        &CreateUser {
            name: format!("User {local_part}"),
            nim: nim.to_string(),
            email: format!("{local_part}@kampus.ac.id"),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            department: "Informatics".to_string(),
            role_id: role_row.id,
            is_verified: true,
        },
    )
    .await
    .expect("user creation should succeed")
}

/// Log in through the API and return the session token.
pub async fn login_for_token(app: Router, identifier: &str) -> String {
    let response = post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({ "identifier": identifier, "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["token"]
        .as_str()
        .expect("login should return a token")
        .to_string()
}

/// Start a guest session and return its token.
pub async fn guest_token(app: Router) -> String {
    let response = send(app, Method::POST, "/api/v1/auth/guest", None, None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["token"]
        .as_str()
        .expect("guest session should return a token")
        .to_string()
}

/// A valid project body.
pub fn project_body(title: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "summary": format!("{title} summary"),
        "department": "Informatics",
        "category": "Machine Learning",
        "tags": ["ML", "Campus"],
        "year": 2025,
    })
}

/// Create a project through the API and return its id.
pub async fn create_project(app: Router, token: &str, title: &str) -> i64 {
    let response = post_json_auth(app, "/api/v1/projects", token, project_body(title)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"]
        .as_i64()
        .expect("created project should have an id")
}
