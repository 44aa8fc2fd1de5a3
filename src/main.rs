use goal_tracker::ai::GeminiClient;
use goal_tracker::{router, spawn_reminder_task, AppState, Config};
use std::{net::SocketAddr, sync::Arc};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    fs::create_dir_all(&config.data_dir).await?;

    if config.ai.api_key.is_none() {
        warn!("no AI credential configured; reflection and chat will report it when used");
    }
    let assistant = Arc::new(GeminiClient::new(config.ai.clone())?);

    let state = AppState::load(config.data_dir.clone(), assistant)
        .await
        .map_err(|err| err.message)?;
    spawn_reminder_task(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(data_dir = %config.data_dir.display(), "listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
