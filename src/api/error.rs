//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::backend::BackendError;
use crate::forms::ValidationErrors;
use crate::marketplace::MarketError;
use crate::notice::Notice;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ValidationErrors>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Invalid login credentials")]
    InvalidCredentials,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Rate limit exceeded")]
    RateLimited { retry_after: u64 },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Backend unavailable: {0}")]
    Upstream(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("{source}")]
    Noticed {
        source: Box<ApiError>,
        notice: Notice,
    },
}

impl ApiError {
    /// Attach the toast the front-end shows for this failure.
    pub fn with_notice(self, notice: Notice) -> Self {
        match self {
            ApiError::Noticed { source, .. } => ApiError::Noticed { source, notice },
            other => ApiError::Noticed {
                source: Box::new(other),
                notice,
            },
        }
    }

    fn parts(self) -> (StatusCode, &'static str, String, Option<ValidationErrors>, Option<Notice>) {
        let (status, code, message, fields) = match self {
            ApiError::Noticed { source, notice } => {
                let (status, code, message, fields, _) = source.parts();
                return (status, code, message, fields, Some(notice));
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
                None,
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid login credentials".to_string(),
                None,
            ),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "FORBIDDEN", detail, None),
            ApiError::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                format!("Rate limit exceeded. Retry after {retry_after}s"),
                None,
            ),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail, None),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail, None),
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION",
                errors
                    .first_message()
                    .unwrap_or("Invalid input")
                    .to_string(),
                Some(errors),
            ),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail, None),
            ApiError::Upstream(detail) => {
                tracing::error!(detail = %detail, "Backend call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "BACKEND_UNAVAILABLE",
                    "The service is unreachable. Please try again.".to_string(),
                    None,
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };
        (status, code, message, fields, None)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let retry_after = match &self {
            ApiError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        };
        let (status, code, message, fields, notice) = self.parts();

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message,
                fields,
            },
            notice,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(retry_after) = retry_after {
            if let Ok(val) = axum::http::HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("Retry-After", val);
            }
        }
        response
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::InvalidCredentials => ApiError::InvalidCredentials,
            BackendError::AccountExists(_) => ApiError::Conflict(err.user_message()),
            BackendError::Unauthorized => ApiError::Unauthorized,
            BackendError::NotFound { .. } => ApiError::NotFound(err.user_message()),
            BackendError::Connection(_)
            | BackendError::Http(_)
            | BackendError::Status { .. }
            | BackendError::ResponseParsing(_) => ApiError::Upstream(err.to_string()),
            BackendError::Database(_) | BackendError::LockPoisoned => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::Validation(errors) => ApiError::Validation(errors),
            MarketError::Transition(e) => ApiError::Conflict(e.to_string()),
            MarketError::Forbidden(reason) => ApiError::Forbidden(reason.to_string()),
            MarketError::NotFound { entity, .. } => ApiError::NotFound(format!("{entity} not found")),
            MarketError::Backend(e) => e.into(),
        }
    }
}

/// Convert a failed mutation into an error carrying its toast. Validation
/// failures get a "Missing information" toast with the first message.
pub fn mutation_failed(err: MarketError, fallback: Notice) -> ApiError {
    let notice = match &err {
        MarketError::Validation(errors) => {
            Notice::missing_information(errors.first_message().unwrap_or("Please check the form"))
        }
        _ => fallback,
    };
    ApiError::from(err).with_notice(notice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_returns_401() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "AUTH_REQUIRED");
        assert!(json.get("notice").is_none());
    }

    #[tokio::test]
    async fn rate_limited_returns_429_with_retry_after() {
        let response = ApiError::RateLimited { retry_after: 60 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "60");
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "RATE_LIMITED");
    }

    #[tokio::test]
    async fn validation_returns_422_with_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("price", "Price must be a positive number.");
        let response = ApiError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "Price must be a positive number.");
        assert_eq!(json["error"]["fields"]["price"], "Price must be a positive number.");
    }

    #[tokio::test]
    async fn upstream_hides_details() {
        let err: ApiError = BackendError::Connection("http://10.0.0.5:54321".into()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert!(!json["error"]["message"].as_str().unwrap().contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn internal_returns_500() {
        let response = ApiError::Internal("something broke".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn noticed_error_keeps_status_and_adds_toast() {
        let err = ApiError::Conflict("A completed booking cannot become cancelled".into())
            .with_notice(Notice::booking_failed());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = body_json(response).await;
        assert_eq!(json["notice"]["title"], "Booking failed");
        assert_eq!(json["notice"]["variant"], "destructive");
    }

    #[tokio::test]
    async fn validation_failure_gets_missing_information_toast() {
        let mut errors = ValidationErrors::new();
        errors.add("location", "Please provide your location and describe the emergency");
        let err = mutation_failed(MarketError::Validation(errors), Notice::emergency_failed());
        let json = body_json(err.into_response()).await;
        assert_eq!(json["notice"]["title"], "Missing information");
    }

    #[test]
    fn market_errors_map_to_statuses() {
        assert!(matches!(
            ApiError::from(MarketError::Forbidden("nope")),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from(MarketError::Backend(BackendError::InvalidCredentials)),
            ApiError::InvalidCredentials
        ));
        assert!(matches!(
            ApiError::from(MarketError::Backend(BackendError::AccountExists("a@b.co".into()))),
            ApiError::Conflict(_)
        ));
    }
}
