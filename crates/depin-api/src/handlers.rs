//! REST API handlers for catalog workloads.
//!
//! Each handler delegates to the `LifecycleManager` and returns JSON
//! responses in the `{success, data?, error?, message?}` envelope.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::warn;

use depin_lifecycle::{DEFAULT_LOG_TAIL, LifecycleError, OperationOutcome};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
pub(crate) struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    pub(crate) fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        })
    }

    pub(crate) fn ok_with_message(data: T, message: String) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
            message: Some(message),
        })
    }
}

pub(crate) fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
            message: None,
        }),
    )
        .into_response()
}

/// Map a lifecycle failure onto a status code and error body.
///
/// Runtime command failures keep their captured output in `data.output`.
pub(crate) fn lifecycle_error_response(err: LifecycleError) -> Response {
    let status = match &err {
        LifecycleError::WorkloadNotFound(_) => StatusCode::NOT_FOUND,
        LifecycleError::AlreadyInstalled(_)
        | LifecycleError::NotInstalled(_)
        | LifecycleError::InvalidState { .. } => StatusCode::BAD_REQUEST,
        LifecycleError::OperationInProgress(_) => StatusCode::CONFLICT,
        LifecycleError::RuntimeUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        LifecycleError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        LifecycleError::Executor { .. }
        | LifecycleError::Store(_)
        | LifecycleError::Catalog(_)
        | LifecycleError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!(error = %err, status = status.as_u16(), "request failed");
    }

    match err.output() {
        Some(output) => (
            status,
            Json(ApiResponse {
                success: false,
                data: Some(serde_json::json!({ "output": output })),
                error: Some(err.to_string()),
                message: None,
            }),
        )
            .into_response(),
        None => error_response(&err.to_string(), status),
    }
}

fn operation_response(result: Result<OperationOutcome, LifecycleError>, done: &str) -> Response {
    match result {
        Ok(outcome) => {
            let message = format!("{} {done}", outcome.workload_id);
            ApiResponse::ok_with_message(outcome, message).into_response()
        }
        Err(e) => lifecycle_error_response(e),
    }
}

// ── Catalog ────────────────────────────────────────────────────

/// GET /api/apps
pub async fn list_apps(State(state): State<ApiState>) -> Response {
    match state.manager.list_workloads() {
        Ok(apps) => ApiResponse::ok(apps).into_response(),
        Err(e) => lifecycle_error_response(e),
    }
}

/// GET /api/apps/{id}
pub async fn get_app(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    match state.manager.get_workload(&id) {
        Ok(app) => ApiResponse::ok(app).into_response(),
        Err(e) => lifecycle_error_response(e),
    }
}

/// GET /api/apps/{id}/docs
pub async fn app_docs(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    match state.manager.docs(&id) {
        Ok(Some(content)) => ApiResponse::ok(serde_json::json!({
            "workload_id": id,
            "content": content,
        }))
        .into_response(),
        Ok(None) => error_response("documentation not found", StatusCode::NOT_FOUND),
        Err(e) => lifecycle_error_response(e),
    }
}

// ── Status & logs ──────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub live: bool,
}

/// GET /api/apps/{id}/status
pub async fn app_status(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return error_response(&rejection.body_text(), StatusCode::BAD_REQUEST),
    };
    match state.manager.status(&id, query.live).await {
        Ok(report) => ApiResponse::ok(report).into_response(),
        Err(e) => lifecycle_error_response(e),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    pub tail: Option<u32>,
}

/// GET /api/apps/{id}/logs
pub async fn app_logs(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return error_response(&rejection.body_text(), StatusCode::BAD_REQUEST),
    };
    let tail = query.tail.unwrap_or(DEFAULT_LOG_TAIL);
    match state.manager.logs(&id, tail).await {
        Ok(logs) => ApiResponse::ok(serde_json::json!({
            "workload_id": id,
            "tail": tail,
            "logs": logs,
        }))
        .into_response(),
        Err(e) => lifecycle_error_response(e),
    }
}

// ── Lifecycle ──────────────────────────────────────────────────

/// POST /api/apps/{id}/install
pub async fn install_app(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    operation_response(state.manager.install(&id).await, "installed")
}

/// POST /api/apps/{id}/start
pub async fn start_app(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    operation_response(state.manager.start(&id).await, "started")
}

/// POST /api/apps/{id}/stop
pub async fn stop_app(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    operation_response(state.manager.stop(&id).await, "stopped")
}

/// POST /api/apps/{id}/uninstall
pub async fn uninstall_app(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    operation_response(state.manager.uninstall(&id).await, "uninstalled")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use depin_compose::{ComposeFuture, ComposeOutput, ComposeRuntime, ProbeFuture};
    use depin_core::{BundleRef, Catalog};
    use depin_lifecycle::{LifecycleManager, LifecycleOptions};
    use depin_state::StateStore;

    /// Runtime whose lifecycle commands succeed unless `fail_up` is set.
    #[derive(Default)]
    struct StubRuntime {
        unavailable: AtomicBool,
        fail_up: AtomicBool,
    }

    impl ComposeRuntime for StubRuntime {
        fn up<'a>(&'a self, _bundle: &'a BundleRef, _project: &'a str) -> ComposeFuture<'a> {
            let fail = self.fail_up.load(Ordering::SeqCst);
            Box::pin(async move {
                if fail {
                    ComposeOutput::failed("`docker compose up -d` failed (exit code 1)", "pull access denied")
                } else {
                    ComposeOutput::ok("Started")
                }
            })
        }

        fn stop<'a>(&'a self, _bundle: &'a BundleRef, _project: &'a str) -> ComposeFuture<'a> {
            Box::pin(async { ComposeOutput::ok("Stopped") })
        }

        fn start<'a>(&'a self, _bundle: &'a BundleRef, _project: &'a str) -> ComposeFuture<'a> {
            Box::pin(async { ComposeOutput::ok("Started") })
        }

        fn down<'a>(&'a self, _bundle: &'a BundleRef, _project: &'a str) -> ComposeFuture<'a> {
            Box::pin(async { ComposeOutput::ok("Removed") })
        }

        fn logs<'a>(&'a self, _project: &'a str, tail: u32) -> ComposeFuture<'a> {
            Box::pin(async move { ComposeOutput::ok(format!("tail={tail}\n")) })
        }

        fn ps<'a>(&'a self, _project: &'a str) -> ComposeFuture<'a> {
            Box::pin(async { ComposeOutput::ok("[]") })
        }

        fn probe(&self) -> ProbeFuture<'_> {
            let available = !self.unavailable.load(Ordering::SeqCst);
            Box::pin(async move { available })
        }
    }

    struct TestApi {
        _dir: tempfile::TempDir,
        state: ApiState,
        runtime: Arc<StubRuntime>,
    }

    fn test_api() -> TestApi {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("grass");
        std::fs::create_dir_all(&app).unwrap();
        std::fs::write(app.join("info.toml"), "name = \"Grass\"\nnetwork = \"mainnet\"\n").unwrap();
        std::fs::write(app.join("docker-compose.yaml"), "services: {}\n").unwrap();
        std::fs::write(app.join("docs.md"), "# Grass\n").unwrap();

        let runtime = Arc::new(StubRuntime::default());
        let manager = LifecycleManager::new(
            Catalog::new(dir.path()),
            StateStore::open_in_memory().unwrap(),
            runtime.clone(),
            LifecycleOptions::default(),
        );
        TestApi {
            _dir: dir,
            state: ApiState { manager },
            runtime,
        }
    }

    fn id(s: &str) -> Path<String> {
        Path(s.to_string())
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn list_apps_reports_available() {
        let api = test_api();
        let resp = list_apps(State(api.state)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"][0]["id"], "grass");
        assert_eq!(body["data"][0]["status"], "available");
    }

    #[tokio::test]
    async fn unknown_app_is_404() {
        let api = test_api();
        let resp = get_app(State(api.state.clone()), id("nope")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = install_app(State(api.state), id("nope")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn install_then_reinstall_is_400() {
        let api = test_api();
        let resp = install_app(State(api.state.clone()), id("grass")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["status"], "running");
        assert_eq!(body["message"], "grass installed");

        let resp = install_app(State(api.state), id("grass")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("already installed"));
    }

    #[tokio::test]
    async fn runtime_unavailable_is_503() {
        let api = test_api();
        api.runtime.unavailable.store(true, Ordering::SeqCst);
        let resp = install_app(State(api.state), id("grass")).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn executor_failure_is_500_with_output() {
        let api = test_api();
        api.runtime.fail_up.store(true, Ordering::SeqCst);
        let resp = install_app(State(api.state), id("grass")).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["output"], "pull access denied");
    }

    #[tokio::test]
    async fn stop_start_uninstall_flow() {
        let api = test_api();
        install_app(State(api.state.clone()), id("grass")).await;

        let resp = stop_app(State(api.state.clone()), id("grass")).await;
        assert_eq!(body_json(resp).await["data"]["status"], "stopped");

        let resp = start_app(State(api.state.clone()), id("grass")).await;
        assert_eq!(body_json(resp).await["data"]["status"], "running");

        let resp = uninstall_app(State(api.state.clone()), id("grass")).await;
        assert_eq!(body_json(resp).await["data"]["status"], "available");

        let resp = uninstall_app(State(api.state), id("grass")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn logs_use_default_tail() {
        let api = test_api();
        let resp = app_logs(State(api.state.clone()), id("grass"), Ok(Query(LogsQuery::default()))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        install_app(State(api.state.clone()), id("grass")).await;
        let resp = app_logs(State(api.state), id("grass"), Ok(Query(LogsQuery::default()))).await;
        let body = body_json(resp).await;
        assert_eq!(body["data"]["tail"], DEFAULT_LOG_TAIL);
        assert_eq!(body["data"]["logs"], "tail=100\n");
    }

    #[tokio::test]
    async fn malformed_query_gets_json_error() {
        let api = test_api();
        install_app(State(api.state.clone()), id("grass")).await;

        for uri in ["/api/apps/grass/logs?tail=abc", "/api/apps/grass/logs?tail=-5"] {
            let query = Query::<LogsQuery>::try_from_uri(&uri.parse().unwrap());
            let resp = app_logs(State(api.state.clone()), id("grass"), query).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body = body_json(resp).await;
            assert_eq!(body["success"], false);
            assert!(!body["error"].as_str().unwrap().is_empty());
        }

        let query = Query::<StatusQuery>::try_from_uri(&"/api/apps/grass/status?live=maybe".parse().unwrap());
        let resp = app_status(State(api.state), id("grass"), query).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["success"], false);
    }

    #[tokio::test]
    async fn live_status_includes_containers() {
        let api = test_api();
        install_app(State(api.state.clone()), id("grass")).await;
        let resp = app_status(State(api.state), id("grass"), Ok(Query(StatusQuery { live: true }))).await;
        let body = body_json(resp).await;
        assert_eq!(body["data"]["status"], "running");
        assert!(body["data"]["containers"].is_array());
    }

    #[tokio::test]
    async fn docs_served_when_present() {
        let api = test_api();
        let resp = app_docs(State(api.state), id("grass")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["data"]["content"], "# Grass\n");
    }

    #[test]
    fn timeout_maps_to_gateway_timeout() {
        let resp = lifecycle_error_response(LifecycleError::Timeout {
            workload_id: "grass".to_string(),
            operation: depin_lifecycle::Operation::Install,
            after: Duration::from_secs(30),
        });
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);

        let resp = lifecycle_error_response(LifecycleError::OperationInProgress("grass".to_string()));
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
