//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub sessions: usize,
}

/// `GET /api/health`: liveness check.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let sessions = ctx.sessions_read()?.len();

    Ok(Json(HealthResponse {
        status: "ok",
        backend: ctx.backend.kind(),
        version: crate::config::APP_VERSION,
        uptime_secs: ctx.started_at.elapsed().as_secs(),
        sessions,
    }))
}
