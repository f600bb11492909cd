//! depin-api: REST API for the DePIN hub.
//!
//! Provides axum route handlers for browsing the workload catalog and
//! driving installations through their lifecycle.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/apps` | List workloads with computed status |
//! | GET | `/api/apps/{id}` | Workload detail and installation |
//! | GET | `/api/apps/{id}/status` | Status (`?live=true` asks the runtime) |
//! | POST | `/api/apps/{id}/install` | Install a workload |
//! | POST | `/api/apps/{id}/start` | Start a stopped workload |
//! | POST | `/api/apps/{id}/stop` | Stop a running workload |
//! | POST | `/api/apps/{id}/uninstall` | Tear down and forget a workload |
//! | GET | `/api/apps/{id}/logs` | Container logs (`?tail=N`) |
//! | GET | `/api/apps/{id}/docs` | Long-form documentation |
//! | GET | `/api/installations` | Installation records |
//! | GET | `/api/docker/health` | Container runtime probe |
//! | GET | `/api/health` | Service health summary |

pub mod handlers;
pub mod system_handlers;

use axum::Router;
use axum::routing::{get, post};
use depin_lifecycle::LifecycleManager;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub manager: LifecycleManager,
}

/// Build the complete API router.
pub fn build_router(manager: LifecycleManager) -> Router {
    let state = ApiState { manager };

    Router::new()
        .route("/api/apps", get(handlers::list_apps))
        .route("/api/apps/{id}", get(handlers::get_app))
        .route("/api/apps/{id}/status", get(handlers::app_status))
        .route("/api/apps/{id}/install", post(handlers::install_app))
        .route("/api/apps/{id}/start", post(handlers::start_app))
        .route("/api/apps/{id}/stop", post(handlers::stop_app))
        .route("/api/apps/{id}/uninstall", post(handlers::uninstall_app))
        .route("/api/apps/{id}/logs", get(handlers::app_logs))
        .route("/api/apps/{id}/docs", get(handlers::app_docs))
        .route("/api/installations", get(system_handlers::list_installations))
        .route("/api/docker/health", get(system_handlers::docker_health))
        .route("/api/health", get(system_handlers::health))
        .with_state(state)
}
