//! Blog Backend
//!
//! Multi-user blog API: accounts, sessions and posts.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! - Routes: HTTP request handling and routing
//! - Services: login, registration and content orchestration
//! - Repositories: account and post stores
//! - Database: PostgreSQL with SQLx, or an in-memory store when no
//!   database URL is configured

use anyhow::Result;
use axum::routing::get;
use blog_backend::{config, db, routes, state::AppState};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() { "production" } else { "development" },
        "Starting Blog Backend"
    );

    if config::AppConfig::is_production() {
        validate_production_config(&config)?;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = if config.database.url.trim().is_empty() {
        warn!("No database URL configured, using in-memory storage");
        AppState::in_memory(config)
    } else {
        info!("Connecting to database...");
        let db_pool =
            db::create_pool(&config.database.url, config.database.max_connections).await?;

        // Run migrations (skip in production if using separate migration job)
        if !config::AppConfig::is_production() {
            db::run_migrations(&db_pool).await?;
        }

        AppState::new(db_pool, config)
    };

    let metrics = install_metrics_and_bootstrap(&state).await?;

    let app = routes::create_router(state)
        .route("/metrics", get(move || std::future::ready(metrics.render())));

    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Install the Prometheus recorder before any startup work that records metrics
async fn install_metrics_and_bootstrap(state: &AppState) -> Result<PrometheusHandle> {
    let metrics = PrometheusBuilder::new().install_recorder()?;
    bootstrap_default_account(state).await?;
    Ok(metrics)
}

/// Create the configured default account if it is missing
async fn bootstrap_default_account(state: &AppState) -> Result<()> {
    let Some((user, password)) = state.config().default_account() else {
        return Ok(());
    };

    state.auth().ensure_default_account(user, password).await?;
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "blog_backend=info,tower_http=info".into()
        } else {
            "blog_backend=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Validate configuration for production deployment
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let errors = config.production_errors();

    if config.database.url.contains("localhost") || config.database.url.contains("127.0.0.1") {
        warn!("Database URL contains localhost - ensure this is intentional for production");
    }

    if !errors.is_empty() {
        for err in &errors {
            error!("Configuration error: {}", err);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
