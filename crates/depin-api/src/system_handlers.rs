//! REST API handlers for service-level health and bookkeeping.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::ApiState;
use crate::handlers::{ApiResponse, error_response, lifecycle_error_response};

/// GET /api/installations
pub async fn list_installations(State(state): State<ApiState>) -> Response {
    match state.manager.installations() {
        Ok(records) => ApiResponse::ok(records).into_response(),
        Err(e) => lifecycle_error_response(e),
    }
}

/// GET /api/docker/health
pub async fn docker_health(State(state): State<ApiState>) -> Response {
    if state.manager.runtime_available().await {
        ApiResponse::ok(serde_json::json!({
            "docker_installed": true,
            "status": "running",
        }))
        .into_response()
    } else {
        error_response(
            "container runtime is not installed or not running",
            StatusCode::SERVICE_UNAVAILABLE,
        )
    }
}

/// GET /api/health
///
/// Reports the hub itself as up; a stopped container runtime or unreadable
/// store shows as a failed check, not as a failed request.
pub async fn health(State(state): State<ApiState>) -> Response {
    let summary = match state.manager.summary().await {
        Ok(summary) => summary,
        Err(e) => return lifecycle_error_response(e),
    };
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let healthy = summary.runtime_available && summary.storage_ok;
    ApiResponse::ok(serde_json::json!({
        "status": if healthy { "healthy" } else { "degraded" },
        "timestamp": timestamp,
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "docker": summary.runtime_available,
            "storage": summary.storage_ok,
        },
        "stats": {
            "total_apps": summary.total_workloads,
            "installed_apps": summary.installed_workloads,
            "running_apps": summary.running_workloads,
        },
    }))
    .into_response()
}
