mod api;
mod bootstrap;
mod catalog;
mod error;
mod health;
mod session;

use std::time::Duration;

use anyhow::Result;
use axum::Router;
use pickwise_core::config::{AppConfig, LoadOptions};
use tokio::sync::oneshot;

fn init_logging(config: &AppConfig) {
    use pickwise_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let drain = Duration::from_secs(app.config.server.graceful_shutdown_secs);

    let routes = service(&app);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        llm_enabled = app.agent_runtime.is_enabled(),
        "pickwise-server listening"
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, routes)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    wait_for_shutdown().await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        drain_secs = drain.as_secs(),
        "pickwise-server stopping"
    );
    let _ = stop_tx.send(());

    match tokio::time::timeout(drain, server).await {
        Ok(joined) => joined??,
        Err(_) => tracing::warn!(
            event_name = "system.server.drain_timeout",
            correlation_id = "shutdown",
            "in-flight requests did not finish before the drain deadline"
        ),
    }
    app.db_pool.close().await;

    Ok(())
}

/// `/api/chat/*` plus `/health`, which is also reachable under the API prefix.
fn service(app: &bootstrap::Application) -> Router {
    let state = api::AppState::new(
        app.db_pool.clone(),
        app.agent_runtime.clone(),
        app.config.upload.max_bytes,
    );
    let health = health::router(health::HealthState::new(
        app.db_pool.clone(),
        app.agent_runtime.is_enabled(),
    ));

    Router::new().nest("/api/chat", api::router(state).merge(health.clone())).merge(health)
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
