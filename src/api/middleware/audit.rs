//! Access logging middleware.
//!
//! Logs every API request with method, path, response status, latency
//! and, once auth has run, the user id.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::UserContext;

/// Identity recorded by handlers behind the auth layer. The access log runs
/// outside it, so the user id travels back on the response.
#[derive(Debug, Clone, Copy)]
pub struct LoggedUser(pub uuid::Uuid);

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let user = response
        .extensions()
        .get::<LoggedUser>()
        .map(|LoggedUser(id)| id.to_string());

    tracing::info!(
        %method,
        path = %path,
        status,
        elapsed_ms,
        user = user.as_deref().unwrap_or("-"),
        "API request"
    );
    response
}

/// Copy the caller's id onto the response for the access log.
pub async fn tag_user(req: Request<axum::body::Body>, next: Next) -> Response {
    let user = req.extensions().get::<UserContext>().map(|u| LoggedUser(u.user_id));
    let mut response = next.run(req).await;
    if let Some(user) = user {
        response.extensions_mut().insert(user);
    }
    response
}
