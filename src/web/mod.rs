//! HTTP control surface for the monitoring service.
//!
//! Exposes the start/stop endpoints, a per-session status view, and a health
//! check. Starting a loop returns immediately; loop health is observed via
//! `/api/status` and the logs.

pub mod config;
pub mod handlers;
pub mod router;

// Re-export commonly used items
pub use config::WebConfig;
pub use router::create_app;

use crate::error::{MonitorError, Result};
use crate::monitor::registry::SessionRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Start the web server over the given session registry.
pub async fn start_web_server(config: WebConfig, registry: Arc<SessionRegistry>) -> Result<()> {
    let app = create_app(registry, &config);

    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| MonitorError::config_error(format!("Invalid bind address: {}", e)))?;

    info!("Starting greenhouse monitor control server on http://{}", addr);
    info!("Start monitoring: http://{}/start", addr);
    info!("Stop monitoring:  http://{}/stop", addr);
    info!("Session status:   http://{}/api/status", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MonitorError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| MonitorError::web_server_error(format!("Server error: {}", e)))?;

    Ok(())
}
