//! HTTP handlers for the control endpoints.

use crate::monitor::registry::SessionRegistry;
use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// Start a new monitoring session.
///
/// Returns an acknowledgement as soon as the session task is spawned; the
/// loop's later health is visible through `/api/status` and the logs, not
/// through this response.
pub async fn start_monitoring(
    State(registry): State<Arc<SessionRegistry>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match registry.start() {
        Ok(id) => Ok(Json(json!({
            "message": "Monitoring started",
            "session": id,
            "active_sessions": registry.active_count(),
        }))),
        Err(e) => {
            error!("Failed to start monitoring session: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Stop all running monitoring sessions.
pub async fn stop_monitoring(
    State(registry): State<Arc<SessionRegistry>>,
) -> Json<serde_json::Value> {
    let signalled = registry.stop_all();
    Json(json!({
        "message": "Monitoring stopped",
        "sessions_signalled": signalled,
    }))
}

/// Per-session state, so operators are not limited to reading logs.
pub async fn get_status(
    State(registry): State<Arc<SessionRegistry>>,
) -> Json<serde_json::Value> {
    Json(json!({
        "active_sessions": registry.active_count(),
        "total_sessions": registry.total_count(),
        "sessions": registry.statuses(),
    }))
}

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "greenhouse-monitor",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
