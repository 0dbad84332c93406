use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use karyakita_api::background;
use karyakita_api::config::ServerConfig;
use karyakita_api::notifications::NotificationRouter;
use karyakita_api::router::build_app_router;
use karyakita_api::state::AppState;
use karyakita_db::DbPool;
use karyakita_events::EventBus;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// How long each background worker gets to wind down after the listener stops.
const WORKER_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        email_domain = %config.allowed_email_domain,
        session_ttl_minutes = config.session_ttl_minutes,
        "Configuration loaded"
    );

    let pool = open_store().await;

    let event_bus = Arc::new(EventBus::default());
    let notifier = tokio::spawn(NotificationRouter::new(pool.clone()).run(event_bus.subscribe()));

    let stop_cleanup = CancellationToken::new();
    let cleanup = tokio::spawn(background::session_cleanup::run(
        pool.clone(),
        Duration::from_secs(config.session_cleanup_interval_secs),
        stop_cleanup.clone(),
    ));

    let addr = SocketAddr::new(
        config.host.parse().expect("HOST must be an IP address"),
        config.port,
    );
    let app = build_app_router(
        AppState {
            pool,
            config: Arc::new(config.clone()),
            event_bus: Arc::clone(&event_bus),
        },
        &config,
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Cannot bind {addr}: {e}"));
    tracing::info!(%addr, "KaryaKita API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");

    // The router exits once the last bus handle is gone; the app state's copy
    // went away with `app`.
    stop_cleanup.cancel();
    drop(event_bus);
    wait_for("session cleanup", cleanup).await;
    wait_for("notification router", notifier).await;

    tracing::info!("Shutdown complete");
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "karyakita_api=debug,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect, verify and migrate. Any failure aborts startup.
async fn open_store() -> DbPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = karyakita_db::create_pool(&url)
        .await
        .expect("Cannot connect to the project store");
    karyakita_db::health_check(&pool)
        .await
        .expect("Project store health check failed");
    karyakita_db::run_migrations(&pool)
        .await
        .expect("Migrations failed");
    tracing::info!("Project store ready");
    pool
}

async fn wait_for(name: &'static str, handle: JoinHandle<()>) {
    match tokio::time::timeout(WORKER_GRACE, handle).await {
        Ok(Ok(())) => tracing::debug!(worker = name, "Worker stopped"),
        Ok(Err(e)) => tracing::error!(worker = name, error = %e, "Worker panicked"),
        Err(_) => tracing::warn!(worker = name, "Worker did not stop in time"),
    }
}

/// Completes on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let interrupt = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Cannot listen for Ctrl-C");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Cannot listen for SIGTERM")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        () = interrupt => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal, "Draining connections");
}
