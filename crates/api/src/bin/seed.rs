//! Seed demo accounts and projects for local development.
//!
//! Creates one admin, one lecturer and one student (skipping any whose email
//! already exists), then gives the lecturer and student a sample project each
//! if they have none. All accounts share `SEED_PASSWORD` (default
//! `karyakita-demo`).

use chrono::Utc;
use karyakita_api::auth::password::hash_password;
use karyakita_api::config::ServerConfig;
use karyakita_core::project::{ProgressStatus, ProjectDraft};
use karyakita_core::review::{initial_status, ReviewStatus};
use karyakita_core::roles::Role;
use karyakita_core::types::DbId;
use karyakita_db::models::project::CreateProject;
use karyakita_db::models::user::CreateUser;
use karyakita_db::repositories::{ProjectRepo, RoleRepo, UserRepo};
use karyakita_db::DbPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type SeedResult<T> = Result<T, Box<dyn std::error::Error>>;

struct DemoAccount {
    name: &'static str,
    nim: &'static str,
    local_part: &'static str,
    department: &'static str,
    role: Role,
}

const ACCOUNTS: [DemoAccount; 3] = [
    DemoAccount {
        name: "Admin KaryaKita",
        nim: "100000001",
        local_part: "admin",
        department: "Academic Affairs",
        role: Role::Admin,
    },
    DemoAccount {
        name: "Budi Santoso",
        nim: "198701010",
        local_part: "budi",
        department: "Informatics",
        role: Role::Lecturer,
    },
    DemoAccount {
        name: "Siti Rahma",
        nim: "22010045",
        local_part: "siti",
        department: "Informatics",
        role: Role::Student,
    },
];

#[tokio::main]
async fn main() -> SeedResult<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "karyakita_seed=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    let database_url = std::env::var("DATABASE_URL")?;
    let password = std::env::var("SEED_PASSWORD").unwrap_or_else(|_| "karyakita-demo".into());

    let pool = karyakita_db::create_pool(&database_url).await?;
    karyakita_db::run_migrations(&pool).await?;

    for account in &ACCOUNTS {
        let email = format!("{}@{}", account.local_part, config.allowed_email_domain);
        let user_id = ensure_account(&pool, account, &email, &password).await?;

        match account.role {
            Role::Lecturer => {
                ensure_project(&pool, user_id, account.role, lecturer_project()).await?
            }
            Role::Student => {
                ensure_project(&pool, user_id, account.role, student_project()).await?
            }
            _ => {}
        }
    }

    tracing::info!("Seeding complete");
    Ok(())
}

async fn ensure_account(
    pool: &DbPool,
    account: &DemoAccount,
    email: &str,
    password: &str,
) -> SeedResult<DbId> {
    if let Some(existing) = UserRepo::find_by_email(pool, email).await? {
        tracing::info!(email, "Account already exists, skipping");
        return Ok(existing.id);
    }

    let role = RoleRepo::find_by_name(pool, account.role.as_str())
        .await?
        .ok_or_else(|| format!("role '{}' is not seeded", account.role))?;

    let user = UserRepo::create(
        pool,
        &CreateUser {
            name: account.name.into(),
            nim: account.nim.into(),
            email: email.into(),
            password_hash: hash_password(password).map_err(|e| e.to_string())?,
            department: account.department.into(),
            role_id: role.id,
            is_verified: true,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, email, role = %account.role, "Account created");
    Ok(user.id)
}

async fn ensure_project(pool: &DbPool, owner_id: DbId, role: Role, draft: ProjectDraft) -> SeedResult<()> {
    let stats = UserRepo::stats(pool, owner_id, ReviewStatus::Published.id()).await?;
    if stats.total_projects > 0 {
        return Ok(());
    }

    let review_status = initial_status(role);
    let project = ProjectRepo::create(
        pool,
        &CreateProject {
            owner_id,
            content: draft.into_content()?,
            review_status,
            published_at: (review_status == ReviewStatus::Published).then(Utc::now),
        },
    )
    .await?;

    tracing::info!(project_id = project.id, title = %project.title, status = %project.review_status, "Project created");
    Ok(())
}

fn lecturer_project() -> ProjectDraft {
    ProjectDraft {
        title: "Smart Campus IoT".into(),
        summary: "Sensor network that reports classroom occupancy and air quality across campus.".into(),
        department: "Informatics".into(),
        category: "Internet of Things".into(),
        tags: vec!["IoT".into(), "Sensors".into(), "Dashboard".into()],
        demo_link: None,
        thumbnail: Some("#27AE60".into()),
        completion_date: None,
        year: Some(2025),
        progress: ProgressStatus::Completed,
    }
}

fn student_project() -> ProjectDraft {
    ProjectDraft {
        title: "FoodWaste Detector".into(),
        summary: "Image classifier that estimates plate waste in the campus canteen.".into(),
        department: "Informatics".into(),
        category: "Machine Learning".into(),
        tags: vec!["ML".into(), "Computer Vision".into()],
        demo_link: None,
        thumbnail: None,
        completion_date: None,
        year: Some(2025),
        progress: ProgressStatus::InProgress,
    }
}
