//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves it against the
//! session cache, and injects `UserContext` into request extensions for
//! downstream handlers.
//!
//! A cached backend token close to expiry is refreshed first. When the
//! refresh is refused, or a handler answers 401 because the backend
//! rejected the token, the session is evicted so the browser signs in again.

use axum::http::{HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::backend::BackendError;
use crate::session::AccessToken;

pub fn bearer_token<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Require a live session.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
/// On success: injects `UserContext` and marks the response `no-store`.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = bearer_token(&req).ok_or(ApiError::Unauthorized)?.to_string();

    let user = match resolve_session(&ctx, &token).await {
        Ok(user) => user,
        Err(err) => {
            ctx.revoke_evicted().await;
            return Err(err);
        }
    };
    let user_id = user.user_id;

    req.extensions_mut().insert(user);

    let mut response = next.run(req).await;
    if response.status() == StatusCode::UNAUTHORIZED {
        ctx.sessions_write()?.evict(&token);
        tracing::info!(user = %user_id, "Backend rejected session token, session ended");
    }
    ctx.revoke_evicted().await;

    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));

    Ok(response)
}

enum Lookup {
    Live(UserContext),
    Expired(Option<AccessToken>),
}

/// Find the live session behind `token`, refreshing its backend token
/// when it is about to expire.
async fn resolve_session(ctx: &ApiContext, token: &str) -> Result<UserContext, ApiError> {
    let lookup = {
        let mut sessions = ctx.sessions_write()?;
        match sessions.touch(token) {
            None => return Err(ApiError::Unauthorized),
            Some(session) if session.needs_refresh() => {
                Lookup::Expired(session.refresh_token().cloned())
            }
            Some(session) => Lookup::Live(UserContext::from_session(session, token)),
        }
    }; // RwLockWriteGuard dropped here, before any .await

    let refresh_token = match lookup {
        Lookup::Live(user) => return Ok(user),
        Lookup::Expired(Some(refresh_token)) => refresh_token,
        Lookup::Expired(None) => {
            ctx.sessions_write()?.evict(token);
            return Err(ApiError::Unauthorized);
        }
    };

    let refreshed = ctx
        .blocking(move |backend| backend.refresh_session(refresh_token.expose()))
        .await?;

    match refreshed {
        Ok(session) => {
            let mut sessions = ctx.sessions_write()?;
            let cached = sessions.renew(token, &session).ok_or(ApiError::Unauthorized)?;
            tracing::debug!(user = %cached.user_id(), "Backend session refreshed");
            Ok(UserContext::from_session(cached, token))
        }
        Err(BackendError::Unauthorized) => {
            ctx.sessions_write()?.evict(token);
            tracing::info!("Session refresh refused, session ended");
            Err(ApiError::Unauthorized)
        }
        Err(e) => Err(e.into()),
    }
}
