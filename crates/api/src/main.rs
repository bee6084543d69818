use std::net::SocketAddr;
use std::sync::Arc;

use folio_core::cache::SystemClock;
use folio_github::{GithubClient, GithubConfig, StatsService};
use folio_notify::{EmailConfig, SmtpNotifier};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_api::config::ServerConfig;
use folio_api::publishing::bootstrap::ensure_admin;
use folio_api::router::build_app_router;
use folio_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        media_root = %config.media.root.display(),
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = folio_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    folio_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    folio_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Admin bootstrap ---
    if let Some(admin) = &config.admin {
        ensure_admin(&pool, admin)
            .await
            .expect("Failed to create bootstrap admin");
    }

    // --- Media root ---
    std::fs::create_dir_all(&config.media.root).expect("Failed to create media root");

    // --- App state ---
    let mut state = AppState::new(pool, config.clone());

    match EmailConfig::from_env() {
        Some(email) => {
            let notifier = SmtpNotifier::new(&email).expect("Invalid SMTP configuration");
            tracing::info!(smtp_host = %email.smtp_host, "Contact email notifications enabled");
            state = state.with_notifier(Arc::new(notifier));
        }
        None => tracing::info!("SMTP_HOST or CONTACT_EMAIL unset; contact emails disabled"),
    }

    match GithubConfig::from_env() {
        Some(github) => {
            tracing::info!(username = %github.username, ttl_secs = github.cache_ttl.as_secs(), "GitHub stats enabled");
            let ttl = github.cache_ttl;
            let client = GithubClient::new(github).expect("Failed to build GitHub client");
            let service = StatsService::new(Arc::new(client), ttl, Arc::new(SystemClock));
            state = state.with_github(Arc::new(service));
        }
        None => tracing::info!("GITHUB_USERNAME unset; GitHub stats disabled"),
    }

    // --- Router ---
    let app = build_app_router(state, &config).expect("Invalid HTTP configuration");

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
