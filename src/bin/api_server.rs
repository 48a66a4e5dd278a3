// API Server Binary Entry Point
//
// Purpose: Start the Axum API server over the GreenBuild decision core
// Usage: cargo run --features api --bin api_server

use greenbuild_rust::{create_router, AppState, ServiceConfig};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "greenbuild_rust=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    let config = ServiceConfig::from_env()?;

    tracing::info!("Configuration:");
    tracing::info!("  PORT: {}", config.port);
    tracing::info!("  CATALOG_PATH: {:?}", config.catalog_path);
    tracing::info!(
        "  MODEL: {}",
        config
            .model
            .as_ref()
            .map(|m| format!("{} @ {}", m.model, m.base_url))
            .unwrap_or_else(|| "disabled".to_string())
    );
    tracing::info!("  MODEL_TIMEOUT: {:?}", config.model_timeout);
    tracing::info!("  RETRY_BACKOFF: {:?}", config.retry_backoff);
    tracing::info!("  SESSION_TTL: {:?}", config.session_ttl);

    // Initialize application state (loads catalog, builds model client)
    let state = AppState::from_config(&config)?;
    tracing::info!("Application state initialized successfully");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
