//! HTTP transport for the query service.
//!
//! Routes:
//! - `POST /query` with `{"question": "..."}` answers a question
//! - `GET /health` reports liveness without touching the database
//!
//! Failures are returned as `{"error": <kind>, "detail": <message>}`, plus a
//! `suggestion` for connection failures and the refused `sql` for unsafe
//! queries.

use crate::error::{ErrorKind, PipelineError, PipelineResult};
use crate::models::{QueryResponse, Question};
use crate::pipeline::{CancelHandle, Pipeline};
use crate::transport::Transport;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info, warn};

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    cancel: CancelHandle,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, cancel: CancelHandle) -> Self {
        Self { pipeline, cancel }
    }
}

/// Error body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorKind,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

/// Pipeline error rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self(err)
    }
}

/// HTTP status for each error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput | ErrorKind::UnsafeQuery => StatusCode::BAD_REQUEST,
        ErrorKind::Backend => StatusCode::BAD_GATEWAY,
        ErrorKind::Connection | ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Execution | ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let body = ErrorBody {
            error: kind,
            detail: self.0.to_string(),
            suggestion: self.0.suggestion().map(String::from),
            sql: self.0.rejected_sql().map(String::from),
        };
        (status_for(kind), Json(body)).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn query(
    State(state): State<AppState>,
    payload: Result<Json<Question>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(question) =
        payload.map_err(|e| PipelineError::invalid_input(format!("Invalid request body: {}", e)))?;

    let token = state.cancel.token();
    match state.pipeline.answer(&question, &token).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            warn!(kind = %e.kind(), error = %e, "Query failed");
            Err(ApiError(e))
        }
    }
}

/// Build the CORS layer. An empty origin list allows any origin.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Create the API router.
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/query", post(query))
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

/// HTTP transport implementation.
pub struct HttpTransport {
    pipeline: Arc<Pipeline>,
    cancel: CancelHandle,
    allowed_origins: Vec<String>,
    /// Host to bind to
    host: String,
    /// Port to bind to
    port: u16,
}

impl HttpTransport {
    pub fn new(
        pipeline: Arc<Pipeline>,
        host: impl Into<String>,
        port: u16,
        allowed_origins: Vec<String>,
    ) -> Self {
        Self {
            pipeline,
            cancel: CancelHandle::new(),
            allowed_origins,
            host: host.into(),
            port,
        }
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Transport for HttpTransport {
    async fn run(&self) -> PipelineResult<()> {
        let bind_addr = self.bind_addr();
        info!("Starting query server on {}", bind_addr);

        let app = router(
            AppState::new(self.pipeline.clone(), self.cancel.clone()),
            &self.allowed_origins,
        );

        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            PipelineError::configuration(format!("Failed to bind to {}: {}", bind_addr, e))
        })?;

        info!(addr = %bind_addr, "Query endpoint ready");

        // In-flight requests are cancelled on shutdown; this only bounds the
        // time spent draining their responses.
        const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(10);

        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let shutdown_notify_clone = shutdown_notify.clone();
        let cancel = self.cancel.clone();

        let shutdown_signal = async move {
            wait_for_signal().await;
            cancel.cancel();
            shutdown_notify_clone.notify_one();
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        return Err(PipelineError::configuration(format!(
                            "HTTP server error: {}",
                            e
                        )));
                    }
                }
            }
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for connections to close (send signal again to force exit)..."
                );

                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {}
        }

        info!("Closing database connections");
        self.pipeline.close().await;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
