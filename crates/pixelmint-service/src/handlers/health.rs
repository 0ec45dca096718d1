//! Health check handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
}

fn response(status: &'static str) -> Json<HealthResponse> {
    Json(HealthResponse {
        status,
        service: "pixelmint",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness: the process is up.
pub async fn health() -> Json<HealthResponse> {
    response("ok")
}

/// Readiness: the store answers.
pub async fn ready(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, response("ok")),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, response("unavailable"))
        }
    }
}
