//! Authentication endpoints.
//!
//! `POST /api/auth/sign-in`: Unprotected: password sign-in
//! `POST /api/auth/sign-up`: Unprotected: registration
//! `POST /api/auth/sign-out`: Protected: end the session
//! `GET /api/auth/me`: Protected: current user and profile
//! `POST /api/auth/become-provider`: Protected: provider onboarding
//!
//! The browser never sees the backend access token. A successful sign-in
//! caches it server-side and hands out an opaque bearer token instead.

use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::backend::{AuthSession, AuthUser, MarketBackend, SignUpRequest};
use crate::marketplace::{self, MarketError};
use crate::models::Profile;
use crate::notice::Notice;
use crate::session::CachedSession;

#[derive(Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    /// Bearer token for subsequent calls. Absent while a new account
    /// still awaits email confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub user: AuthUser,
    pub profile: Option<Profile>,
    pub is_professional: bool,
    pub notice: Notice,
}

fn failure_reason(err: &MarketError) -> String {
    match err {
        MarketError::Validation(errors) => errors
            .first_message()
            .unwrap_or("Please check the form")
            .to_string(),
        MarketError::Backend(e) => e.user_message(),
        other => other.to_string(),
    }
}

fn load_profile(backend: &dyn MarketBackend, session: &AuthSession) -> Option<Profile> {
    backend
        .get_profile(&session.access_token, &session.user.id)
        .unwrap_or_else(|e| {
            tracing::warn!(user = %session.user.id, error = %e, "Profile lookup after sign-in failed");
            None
        })
}

/// Cache a backend session and return the browser's bearer token.
fn open_session(
    ctx: &ApiContext,
    session: &AuthSession,
    profile: Option<Profile>,
) -> Result<String, ApiError> {
    let cached = CachedSession::from_auth(session).with_profile(profile);
    Ok(ctx.sessions_write()?.insert(cached))
}

/// `POST /api/auth/sign-in`
pub async fn sign_in(
    State(ctx): State<ApiContext>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (session, profile) = ctx
        .blocking(move |backend| {
            let session = marketplace::sign_in(backend, &request.email, &request.password)?;
            let profile = load_profile(backend, &session);
            Ok::<_, MarketError>((session, profile))
        })
        .await?
        .map_err(|e| {
            let notice = Notice::sign_in_failed(&failure_reason(&e));
            ApiError::from(e).with_notice(notice)
        })?;

    let token = open_session(&ctx, &session, profile.clone())?;
    ctx.revoke_evicted().await;
    tracing::info!(user = %session.user.id, "Signed in");

    Ok(Json(SessionResponse {
        token: Some(token),
        is_professional: profile.as_ref().is_some_and(|p| p.is_professional),
        user: session.user,
        profile,
        notice: Notice::signed_in(),
    }))
}

/// `POST /api/auth/sign-up`
pub async fn sign_up(
    State(ctx): State<ApiContext>,
    Json(request): Json<SignUpRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let is_professional = request.is_professional;
    let (outcome, profile) = ctx
        .blocking(move |backend| {
            let outcome = marketplace::sign_up(backend, &request)?;
            let profile = outcome
                .session
                .as_ref()
                .and_then(|session| load_profile(backend, session));
            Ok::<_, MarketError>((outcome, profile))
        })
        .await?
        .map_err(|e| {
            let notice = Notice::sign_up_failed(&failure_reason(&e));
            ApiError::from(e).with_notice(notice)
        })?;

    let token = match outcome.session {
        Some(ref session) => Some(open_session(&ctx, session, profile.clone())?),
        None => None,
    };
    ctx.revoke_evicted().await;

    Ok(Json(SessionResponse {
        notice: Notice::registered(token.is_none(), is_professional),
        token,
        user: outcome.user,
        profile,
        is_professional,
    }))
}

#[derive(Serialize)]
pub struct NoticeResponse {
    pub notice: Notice,
}

/// `POST /api/auth/sign-out`
pub async fn sign_out(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<NoticeResponse>, ApiError> {
    ctx.sessions_write()?.remove(user.bearer.expose());

    let user_id = user.user_id;
    let result = ctx
        .blocking(move |backend| backend.sign_out(user.access_token.expose()))
        .await?;
    if let Err(e) = result {
        // The local session is gone either way.
        tracing::warn!(user = %user_id, error = %e, "Backend sign-out failed");
    }

    Ok(Json(NoticeResponse {
        notice: Notice::signed_out(),
    }))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: AuthUser,
    pub profile: Option<Profile>,
    pub is_professional: bool,
}

/// `GET /api/auth/me`: refreshes the cached profile.
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<MeResponse>, ApiError> {
    let user_id = user.user_id;
    let email = user.email.clone();
    let cached_flag = user.is_professional;

    let profile = ctx
        .blocking(move |backend| marketplace::get_own_profile(backend, user.actor()))
        .await??;
    if let Some(ref p) = profile {
        ctx.sessions_write()?.set_profile(&user_id, p.clone());
    }

    Ok(Json(MeResponse {
        is_professional: profile.as_ref().map_or(cached_flag, |p| p.is_professional),
        user: AuthUser { id: user_id, email },
        profile,
    }))
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub profile: Profile,
    pub notice: Notice,
}

/// `POST /api/auth/become-provider`
pub async fn become_provider(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user_id = user.user_id;
    let profile = ctx
        .blocking(move |backend| marketplace::become_provider(backend, user.actor(), Utc::now()))
        .await?
        .map_err(|e| {
            let notice = Notice::destructive("Error", failure_reason(&e));
            ApiError::from(e).with_notice(notice)
        })?;

    ctx.sessions_write()?.set_profile(&user_id, profile.clone());

    Ok(Json(ProfileResponse {
        profile,
        notice: Notice::became_provider(),
    }))
}
