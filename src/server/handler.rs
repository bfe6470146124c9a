// Axum request handlers — translate HTTP audit calls into orchestrator operations.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::audit::AuditResult;
use crate::engine::orchestrator::Orchestrator;
use crate::error::{AuditError, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AuditError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuditError::Validation(_) => StatusCode::BAD_REQUEST,
            AuditError::AuditFailed { .. }
            | AuditError::Orchestration(_)
            | AuditError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/api/audit", post(audit_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/health", get(health_handler))
        .with_state(orchestrator)
}

pub struct AuditServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl AuditServer {
    /// Bind `addr` (port 0 picks a free port) and serve in the background.
    pub async fn start(orchestrator: Arc<Orchestrator>, addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;

        let shutdown = CancellationToken::new();
        let app = router(orchestrator);

        let signal = shutdown.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(signal.cancelled_owned())
                .await
            {
                error!("audit server stopped with error: {}", e);
            }
        });

        info!("audit server listening on http://{}", addr);
        Ok(Self {
            addr,
            shutdown,
            task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Absolute URL for `path` on this server.
    pub fn url_for(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            error!("audit server task failed: {}", e);
        }
    }
}

/// A string field of the request body. Absent and `null` read as missing;
/// any other JSON type is handed back as the offending value.
fn string_field<'a>(body: &'a Value, key: &str) -> Result<Option<&'a str>, &'a Value> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(other),
    }
}

/// POST /api/audit — audit one url under one device profile.
async fn audit_handler(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AuditResult>, AuditError> {
    let Json(body) =
        payload.map_err(|rejection| ValidationError::MalformedBody(rejection.body_text()))?;

    let device = string_field(&body, "device")
        .map_err(|v| ValidationError::InvalidDevice(v.to_string()))?;
    let url = string_field(&body, "url")
        .map_err(|v| ValidationError::InvalidUrl(format!("expected a string, got {}", v)))?;

    let result = orchestrator.handle(url, device).await.map_err(|e| {
        if !matches!(e, AuditError::Validation(_)) {
            warn!("audit request failed: {}", e);
        }
        e
    })?;
    Ok(Json(result))
}

/// GET /api/stats — counters snapshot.
async fn stats_handler(State(orchestrator): State<Arc<Orchestrator>>) -> impl IntoResponse {
    Json(orchestrator.stats())
}

/// GET /api/health
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
