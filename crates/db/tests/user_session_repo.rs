//! Integration tests for account and session persistence.

mod common;

use chrono::{Duration, Utc};
use karyakita_core::review::ReviewStatus;
use karyakita_core::roles::Role;
use karyakita_core::sessions::generate_session_token;
use karyakita_db::models::session::CreateSession;
use karyakita_db::models::user::CreateUser;
use karyakita_db::repositories::{ProjectRepo, RoleRepo, SessionRepo, UserRepo};
use sqlx::PgPool;

use common::{create_project, create_user};

fn session_for(user_id: Option<i64>, ttl: Duration) -> (String, CreateSession) {
    let token = generate_session_token();
    let input = CreateSession {
        user_id,
        token_hash: token.hash,
        expires_at: Utc::now() + ttl,
        user_agent: None,
        ip_address: None,
    };
    (token.plaintext, input)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_nim_violates_named_constraint(pool: PgPool) {
    create_user(&pool, "Siti", "22010045", Role::Student).await;
    let role = RoleRepo::find_by_name(&pool, "student")
        .await
        .unwrap()
        .unwrap();
    let err = UserRepo::create(
        &pool,
        &CreateUser {
            name: "Other".into(),
            nim: "22010045".into(),
            email: "other@kampus.ac.id".into(),
            password_hash: "x".into(),
            department: "Informatics".into(),
            role_id: role.id,
            is_verified: false,
        },
    )
    .await
    .unwrap_err();
    let constraint = err.as_database_error().and_then(|e| e.constraint().map(String::from));
    assert_eq!(constraint.as_deref(), Some("uq_users_nim"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_logins_accumulate_and_reset(pool: PgPool) {
    let siti = create_user(&pool, "Siti", "22010045", Role::Student).await;

    assert_eq!(UserRepo::increment_failed_login(&pool, siti.id).await.unwrap(), 1);
    assert_eq!(UserRepo::increment_failed_login(&pool, siti.id).await.unwrap(), 2);
    UserRepo::lock_account(&pool, siti.id, Utc::now() + Duration::minutes(15))
        .await
        .unwrap();

    UserRepo::record_successful_login(&pool, siti.id).await.unwrap();
    let user = UserRepo::find_by_id(&pool, siti.id).await.unwrap().unwrap();
    assert_eq!(user.failed_login_count, 0);
    assert!(user.locked_until.is_none());
    assert!(user.last_login_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn active_session_resolves_role(pool: PgPool) {
    let budi = create_user(&pool, "Budi", "19870101", Role::Lecturer).await;
    let (_, input) = session_for(Some(budi.id), Duration::minutes(120));
    let session = SessionRepo::create(&pool, &input).await.unwrap();
    assert!(!session.is_guest);

    let identity = SessionRepo::find_active_by_token_hash(&pool, &input.token_hash)
        .await
        .unwrap()
        .expect("session is active");
    assert_eq!(identity.user_id, Some(budi.id));
    assert_eq!(identity.role_name.as_deref(), Some("lecturer"));
    assert_eq!(identity.is_active, Some(true));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn guest_session_has_no_user(pool: PgPool) {
    let (_, input) = session_for(None, Duration::minutes(120));
    let session = SessionRepo::create(&pool, &input).await.unwrap();
    assert!(session.is_guest);

    let identity = SessionRepo::find_active_by_token_hash(&pool, &input.token_hash)
        .await
        .unwrap()
        .unwrap();
    assert!(identity.is_guest);
    assert_eq!(identity.user_id, None);
    assert_eq!(identity.role_name, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn revoked_and_expired_sessions_are_inactive_and_cleaned(pool: PgPool) {
    let siti = create_user(&pool, "Siti", "22010045", Role::Student).await;

    let (_, expired) = session_for(Some(siti.id), Duration::minutes(-1));
    SessionRepo::create(&pool, &expired).await.unwrap();
    let (_, revoked) = session_for(Some(siti.id), Duration::minutes(120));
    let revoked_row = SessionRepo::create(&pool, &revoked).await.unwrap();
    assert!(SessionRepo::revoke(&pool, revoked_row.id).await.unwrap());
    let (_, live) = session_for(Some(siti.id), Duration::minutes(120));
    SessionRepo::create(&pool, &live).await.unwrap();

    for hash in [&expired.token_hash, &revoked.token_hash] {
        assert!(SessionRepo::find_active_by_token_hash(&pool, hash)
            .await
            .unwrap()
            .is_none());
    }

    assert_eq!(SessionRepo::cleanup_expired(&pool).await.unwrap(), 2);
    assert!(SessionRepo::find_active_by_token_hash(&pool, &live.token_hash)
        .await
        .unwrap()
        .is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stats_report_top_published_project(pool: PgPool) {
    let budi = create_user(&pool, "Budi", "19870101", Role::Lecturer).await;
    let siti = create_user(&pool, "Siti", "22010045", Role::Student).await;
    let top = create_project(&pool, budi.id, Role::Lecturer, "Smart Campus IoT").await;
    create_project(&pool, budi.id, Role::Lecturer, "Library Kiosk").await;
    ProjectRepo::endorse(&pool, top.id, siti.id).await.unwrap().unwrap();

    let stats = UserRepo::stats(&pool, budi.id, ReviewStatus::Published.id())
        .await
        .unwrap();
    assert_eq!(stats.total_projects, 2);
    assert_eq!(stats.total_endorsements, 1);
    assert_eq!(stats.top_project_title.as_deref(), Some("Smart Campus IoT"));

    let empty = UserRepo::stats(&pool, siti.id, ReviewStatus::Published.id())
        .await
        .unwrap();
    assert_eq!(empty.total_projects, 0);
    assert_eq!(empty.total_endorsements, 0);
    assert!(empty.top_project_title.is_none());
}
