//! Help assistant endpoints.
//!
//! - `GET /api/assistant`: opening greeting
//! - `POST /api/assistant`: reply to a message

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::assistant::{self, AssistantReply};

#[derive(Serialize)]
pub struct GreetingResponse {
    pub greeting: &'static str,
}

/// `GET /api/assistant`
pub async fn greeting() -> Json<GreetingResponse> {
    Json(GreetingResponse {
        greeting: assistant::GREETING,
    })
}

#[derive(Deserialize)]
pub struct AssistantRequest {
    pub message: String,
}

/// `POST /api/assistant`
pub async fn reply(Json(request): Json<AssistantRequest>) -> Result<Json<AssistantReply>, ApiError> {
    assistant::respond(&request.message)
        .map(Json)
        .ok_or_else(|| ApiError::BadRequest("Message is empty".into()))
}
