mod api;
mod auth;
mod config;
mod dto;
mod error;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chatgate_core::SystemClock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::auth::users::InMemoryUsers;
use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chatgate_web=debug,chatgate_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::load()?;
    let bind_addr = config.bind_addr;
    let maintenance_every = Duration::from_secs(config.maintenance_interval_secs.max(1));

    tracing::info!(
        "Rate limit: {} requests per {} ms",
        config.admission.rate_limit.max_requests,
        config.admission.rate_limit.window_ms
    );
    tracing::info!(
        "Login lockout: {} failures -> {}s",
        config.admission.lockout.max_failures,
        config.admission.lockout.lock_seconds
    );
    tracing::info!("CORS origins: {:?}", config.admission.cors.origins);

    let users = Arc::new(InMemoryUsers::from_config(&config.users));
    let state = AppState::new(config, users, Arc::new(SystemClock));

    // Counter cleanup task
    let maintenance = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(maintenance_every);
        loop {
            interval.tick().await;
            maintenance.prune();
        }
    });

    let app = api::app(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("chatgate-web listening on http://{}", bind_addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("chatgate-web stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
