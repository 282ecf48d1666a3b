//! aigrc-server - Standalone entry point for the AIGRC governance event
//! pipeline.
//!
//! This crate is a thin wrapper around `aigrc-api` that produces a runnable
//! binary for deployments without modifying the core library crate.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;

use aigrc_api::auth::JwtAuth;
use aigrc_api::config::ApiConfig;
use aigrc_api::rate_limit::OrgRateLimiter;
use aigrc_api::routes::router;
use aigrc_api::state::AppState;
use aigrc_persist::sqlite::{SqliteBackend, SqliteConfig};
use aigrc_persist::store::EventStore;

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,aigrc_api=debug,tower_http=debug"));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    tracing::info!("starting AIGRC governance event pipeline server");

    let config = ApiConfig::from_env().context("failed to load API configuration")?;
    let jwt_auth = JwtAuth::from_config(&config);
    let rate_limiter = Arc::new(OrgRateLimiter::new(config.requests_per_minute));

    let database_url =
        std::env::var("AIGRC_DATABASE_URL").unwrap_or_else(|_| "sqlite:aigrc.db?mode=rwc".to_string());
    let sqlite_config = SqliteConfig { url: database_url, ..SqliteConfig::default() };
    let backend = Arc::new(
        SqliteBackend::new(sqlite_config)
            .await
            .context("failed to initialize sqlite event store")?,
    ) as Arc<dyn aigrc_persist::backend::StoreBackend>;
    let store = Arc::new(EventStore::new(backend));

    let state = AppState::new(store, jwt_auth, rate_limiter);
    let app = router(state, &config);

    let addr_str = std::env::var("AIGRC_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let addr: SocketAddr = addr_str.parse().context("invalid AIGRC_BIND_ADDR")?;

    tracing::info!(%addr, "AIGRC event pipeline listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining in-flight requests");
}
