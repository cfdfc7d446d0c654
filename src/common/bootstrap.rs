use anyhow::{Context, Result};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::common::config::ServerConfig;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub fn init_env() {
    if dotenvy::dotenv().is_err() {
        tracing::debug!("No .env file found, using the process environment");
    }
}

/// Binds the listener and serves `app` until Ctrl-C.
pub async fn serve(service_name: &str, app: Router, config: &ServerConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("{} listening on {}", service_name, addr);

    let app = app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("{} stopped", service_name);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for the shutdown signal");
    }
}
