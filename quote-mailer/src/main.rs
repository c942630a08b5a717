//! HD Connect mailer - form submission endpoint.
//!
//! Receives quote, intervention and contact requests from the website and
//! forwards them by email through Resend.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hdconnect::{router, AppState, Config, ResendMailer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("mailer_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        resend_api_key_configured = config.resend_api_key.is_some(),
        resend_api_url = %config.resend_api_url,
        target_email = %config.target_email,
        allowed_origins = config.allowed_origins.len(),
        rate_limit_max = config.rate_limit_max,
        rate_limit_window_secs = config.rate_limit_window_secs,
        max_body_size = config.max_body_size,
        "config_loaded"
    );

    if config.resend_api_key.is_none() {
        warn!("resend_api_key_missing");
    }

    let mailer = ResendMailer::from_config(&config).context("Failed to build HTTP client")?;
    let state = AppState::new(config.clone(), Arc::new(mailer));

    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "mailer_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("mailer_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_failed");
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
                warn!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("mailer_shutting_down");
}
