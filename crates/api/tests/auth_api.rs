//! HTTP-level tests for registration, login, guest sessions and logout.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_auth, post_auth, post_json};
use karyakita_core::roles::Role;
use sqlx::PgPool;

fn registration(nim: &str, email: &str) -> serde_json::Value {
    serde_json::json!({
        "name": "Siti Rahma",
        "nim": nim,
        "department": "Informatics",
        "email": email,
        "password": "rahasia-kampus-123",
    })
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_creates_student_and_session(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/auth/register",
        registration("2201 0045", " Siti@Kampus.ac.id "),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["role"], "student");
    assert_eq!(data["is_guest"], false);
    assert_eq!(data["user"]["nim"], "22010045");
    assert_eq!(data["user"]["email"], "siti@kampus.ac.id");
    assert_eq!(data["user"]["is_verified"], false);
    assert_eq!(data["user"]["stats"]["total_projects"], 0);
    assert!(data["user"].get("password_hash").is_none());

    let token = data["token"].as_str().unwrap();
    assert!(token.starts_with("sess_"));

    let session = get_auth(app, "/api/v1/auth/session", token).await;
    assert_eq!(session.status(), StatusCode::OK);
    assert_eq!(body_json(session).await["data"]["user"]["name"], "Siti Rahma");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_rejects_foreign_domain(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/auth/register",
        registration("22010045", "siti@gmail.com"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_rejects_duplicate_nim(pool: PgPool) {
    let app = common::build_test_app(pool);

    let first = post_json(
        app.clone(),
        "/api/v1/auth/register",
        registration("22010045", "siti@kampus.ac.id"),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(
        app,
        "/api/v1/auth/register",
        registration("2201 0045", "other@kampus.ac.id"),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json = body_json(second).await;
    assert_eq!(json["code"], "CONFLICT");
    assert!(json["error"].as_str().unwrap().contains("NIM"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_by_email_or_nim(pool: PgPool) {
    common::create_test_user(&pool, "budi", "198701010", Role::Lecturer).await;
    let app = common::build_test_app(pool);

    for identifier in ["budi@kampus.ac.id", "BUDI@kampus.ac.id", "1987 01010"] {
        let response = post_json(
            app.clone(),
            "/api/v1/auth/login",
            serde_json::json!({ "identifier": identifier, "password": common::TEST_PASSWORD }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "identifier {identifier}");
        let json = body_json(response).await;
        assert_eq!(json["data"]["role"], "lecturer");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_account_and_wrong_password_look_the_same(pool: PgPool) {
    common::create_test_user(&pool, "siti", "22010045", Role::Student).await;
    let app = common::build_test_app(pool);

    let wrong_password = post_json(
        app.clone(),
        "/api/v1/auth/login",
        serde_json::json!({ "identifier": "siti@kampus.ac.id", "password": "nope-nope" }),
    )
    .await;
    let unknown = post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({ "identifier": "nobody@kampus.ac.id", "password": "nope-nope" }),
    )
    .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(wrong_password).await["error"],
        body_json(unknown).await["error"]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn five_failures_lock_the_account(pool: PgPool) {
    common::create_test_user(&pool, "siti", "22010045", Role::Student).await;
    let app = common::build_test_app(pool);

    for _ in 0..5 {
        let response = post_json(
            app.clone(),
            "/api/v1/auth/login",
            serde_json::json!({ "identifier": "22010045", "password": "wrong-password" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused while locked.
    let response = post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({ "identifier": "22010045", "password": common::TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_lock_starts_a_fresh_failure_streak(pool: PgPool) {
    let siti = common::create_test_user(&pool, "siti", "22010045", Role::Student).await;
    let app = common::build_test_app(pool.clone());
    let wrong = serde_json::json!({ "identifier": "22010045", "password": "wrong-password" });

    for _ in 0..5 {
        let response = post_json(app.clone(), "/api/v1/auth/login", wrong.clone()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    sqlx::query("UPDATE users SET locked_until = NOW() - INTERVAL '1 minute' WHERE id = $1")
        .bind(siti.id)
        .execute(&pool)
        .await
        .unwrap();

    // One typo after the lock ran out must not re-lock the account.
    let response = post_json(app.clone(), "/api/v1/auth/login", wrong).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (count, locked): (i32, bool) =
        sqlx::query_as("SELECT failed_login_count, locked_until IS NOT NULL FROM users WHERE id = $1")
            .bind(siti.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
    assert!(!locked);

    let response = post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({ "identifier": "22010045", "password": common::TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn guest_session_is_read_only(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = common::guest_token(app.clone()).await;

    let session = get_auth(app.clone(), "/api/v1/auth/session", &token).await;
    assert_eq!(session.status(), StatusCode::OK);
    let json = body_json(session).await;
    assert_eq!(json["data"]["is_guest"], true);
    assert_eq!(json["data"]["role"], "guest");
    assert!(json["data"]["user"].is_null());

    let create = common::post_json_auth(
        app,
        "/api/v1/projects",
        &token,
        common::project_body("Guest Project"),
    )
    .await;
    assert_eq!(create.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_revokes_the_session(pool: PgPool) {
    common::create_test_user(&pool, "siti", "22010045", Role::Student).await;
    let app = common::build_test_app(pool);
    let token = common::login_for_token(app.clone(), "siti@kampus.ac.id").await;

    let response = post_auth(app.clone(), "/api/v1/auth/logout", &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let session = get_auth(app, "/api/v1/auth/session", &token).await;
    assert_eq!(session.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn session_without_token_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/auth/session").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_token_is_unauthorized_even_on_public_reads(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/projects", "sess_not-a-real-token").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
