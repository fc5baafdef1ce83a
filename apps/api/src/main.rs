//! # IFTA QuickCalc API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          API Server                                     │
//! │                                                                         │
//! │  Frontend ───► HTTP (8080) ───► routes ───► ifta-core (pure)            │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                              ifta-rates ───► live rate source           │
//! │                              (fallback)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ifta_api::{router, ApiConfig, AppState, EntitlementStore};
use ifta_rates::{RateProvider, RatesConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (RUST_LOG overrides the default level)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting IFTA QuickCalc API server...");

    // Load configuration
    let config = ApiConfig::load().context("invalid API configuration")?;
    info!(
        addr = %config.bind_address(),
        quarters = config.quarters.len(),
        default_quarter = %config.default_quarter,
        "Configuration loaded"
    );

    // Rate provider: a broken rates config must not take the calculator down
    let rates_config = match config.rates_config.clone() {
        Some(path) => RatesConfig::load(Some(path)).context("invalid rates configuration")?,
        None => RatesConfig::load_or_default(None),
    };
    let rates = RateProvider::from_config(&rates_config).context("invalid rate source")?;

    // Paid markers
    let entitlements = match config.entitlements_file {
        Some(ref path) => EntitlementStore::load(path).context("failed to load entitlements")?,
        None => {
            warn!("No entitlements file configured, every signed-in user is unpaid");
            EntitlementStore::new()
        }
    };

    let bind_addr = config.bind_address();
    let state = Arc::new(AppState::new(config, rates, entitlements));
    let app = router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", bind_addr))?;
    info!(addr = %bind_addr, "HTTP server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
