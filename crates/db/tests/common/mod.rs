//! Fixtures shared by the repository tests.

use karyakita_core::project::{ProgressStatus, ProjectContent};
use karyakita_core::review::{initial_status, ReviewStatus};
use karyakita_core::roles::Role;
use karyakita_core::types::DbId;
use karyakita_db::models::project::{CreateProject, Project};
use karyakita_db::models::user::{CreateUser, User};
use karyakita_db::repositories::{ProjectRepo, RoleRepo, UserRepo};
use sqlx::PgPool;

pub async fn create_user(pool: &PgPool, name: &str, nim: &str, role: Role) -> User {
    let role_row = RoleRepo::find_by_name(pool, role.as_str())
        .await
        .unwrap()
        .expect("role is seeded");
    let input = CreateUser {
        name: name.to_string(),
        nim: nim.to_string(),
        email: format!("{nim}@kampus.ac.id"),
        password_hash: "not-a-real-hash".to_string(),
        department: "Informatics".to_string(),
        role_id: role_row.id,
        is_verified: role != Role::Student,
    };
    UserRepo::create(pool, &input).await.unwrap()
}

pub fn content(title: &str, tags: &[&str]) -> ProjectContent {
    ProjectContent {
        title: title.to_string(),
        summary: format!("Summary of {title}"),
        department: "Informatics".to_string(),
        category: "Internet of Things".to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        demo_link: None,
        thumbnail: "#2F80ED".to_string(),
        completion_date: None,
        year: Some(2025),
        progress: ProgressStatus::InProgress,
    }
}

/// Create a project the way the catalog does: initial state from the creator's role.
pub async fn create_project(pool: &PgPool, owner_id: DbId, role: Role, title: &str) -> Project {
    let review_status = initial_status(role);
    let input = CreateProject {
        owner_id,
        content: content(title, &["IoT", "Sensors"]),
        review_status,
        published_at: (review_status == ReviewStatus::Published).then(chrono::Utc::now),
    };
    ProjectRepo::create(pool, &input).await.unwrap()
}
