//! Request handlers

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

/// Body of `GET /health`. Always served with HTTP 200; a failed session
/// is reported through `lastErr`, not through the status code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub target: String,
    pub viewport: String,
    #[serde(rename = "navCount")]
    pub nav_count: u64,
    #[serde(rename = "lastErr")]
    pub last_err: Option<String>,
}

/// Health check endpoint. Reads a snapshot of the session health state;
/// never waits on the session pipeline.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.health.snapshot();
    Json(HealthResponse {
        ok: snapshot.ready,
        target: state.config.target_url.clone(),
        viewport: state.config.viewport_label(),
        nav_count: snapshot.nav_count,
        last_err: snapshot.last_error,
    })
}
