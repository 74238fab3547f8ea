//! Emergency SOS endpoints (signed-in users).
//!
//! - `POST /api/emergency`: raise an SOS
//! - `GET /api/emergency`: the caller's SOS history

use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::{mutation_failed, ApiError};
use crate::api::types::{ApiContext, UserContext};
use crate::forms::EmergencyForm;
use crate::marketplace;
use crate::models::EmergencySos;
use crate::notice::Notice;

#[derive(Serialize)]
pub struct EmergencyResponse {
    pub emergency: EmergencySos,
    pub notice: Notice,
}

/// `POST /api/emergency`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Json(form): Json<EmergencyForm>,
) -> Result<Json<EmergencyResponse>, ApiError> {
    let emergency = ctx
        .blocking(move |backend| marketplace::create_emergency_sos(backend, user.actor(), &form))
        .await?
        .map_err(|e| mutation_failed(e, Notice::emergency_failed()))?;

    Ok(Json(EmergencyResponse {
        emergency,
        notice: Notice::emergency_sent(),
    }))
}

#[derive(Serialize)]
pub struct EmergencyListResponse {
    pub emergencies: Vec<EmergencySos>,
}

/// `GET /api/emergency`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<EmergencyListResponse>, ApiError> {
    let emergencies = ctx
        .blocking(move |backend| marketplace::get_client_emergencies(backend, user.actor()))
        .await??;
    Ok(Json(EmergencyListResponse { emergencies }))
}
