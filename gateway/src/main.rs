//! Courier Gateway - webhook receiver and send front for Resend.
//!
//! This binary runs the web server that:
//! - Receives and verifies signed webhook callbacks
//! - Dispatches verified events to their handlers
//! - Exposes thin send and double opt-in endpoints over the provider API

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use courier::{router, AppState, Config, ResendClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("gateway_starting");

    // Load configuration; a missing API key fails here, not per request
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        port = config.port,
        base_url = %config.base_url,
        webhook_secret_configured = config.webhook_secret.is_some(),
        audience_configured = config.audience_id.is_some(),
        from_address = %config.from_address,
        "config_loaded"
    );

    // Create the provider client
    let resend = ResendClient::new(config.api_key.clone(), config.base_url.clone())
        .context("Failed to build API client")?;

    // Create application state and router
    let state = AppState::new(config.clone(), resend);
    let app = router(state).layer(TraceLayer::new_for_http());

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "gateway_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("gateway_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("gateway_shutting_down");
}
