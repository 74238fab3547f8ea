//! API router.
//!
//! Returns a composable `Router` with every route under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. CORS (when an origin is configured) → 2. Access log → 3. Rate limiter
//! → 4. Auth validator (protected methods only) → 5. User tagging

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post, put, MethodRouter};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the API router around a shared context.
///
/// Middleware uses `Extension<ApiContext>` (injected outside the rate limiter).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(ctx: ApiContext) -> Router {
    build_router(ctx)
}

/// Protect one method route: the auth layer resolves the session and the
/// inner layer tags the response for the access log.
fn authed(route: MethodRouter<ApiContext>) -> MethodRouter<ApiContext> {
    route
        .route_layer(axum::middleware::from_fn(middleware::audit::tag_user))
        .route_layer(axum::middleware::from_fn(middleware::auth::require_auth))
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/categories", get(endpoints::categories::list))
        .route(
            "/categories/:id/professionals",
            get(endpoints::categories::professionals),
        )
        .route("/professionals", get(endpoints::professionals::browse))
        .route("/professionals/featured", get(endpoints::professionals::featured))
        .route("/professionals/count", get(endpoints::professionals::count))
        .route("/professionals/:id", get(endpoints::professionals::detail))
        .route(
            "/professionals/:id/services",
            get(endpoints::professionals::services)
                .merge(authed(post(endpoints::professionals::add_service))),
        )
        .route(
            "/professionals/:id/bookings",
            authed(get(endpoints::professionals::bookings)),
        )
        .route(
            "/bookings",
            authed(get(endpoints::bookings::list).post(endpoints::bookings::create)),
        )
        .route(
            "/bookings/:id/status",
            authed(post(endpoints::bookings::update_status)),
        )
        .route(
            "/emergency",
            authed(get(endpoints::emergency::list).post(endpoints::emergency::create)),
        )
        .route("/auth/sign-in", post(endpoints::auth::sign_in))
        .route("/auth/sign-up", post(endpoints::auth::sign_up))
        .route("/auth/sign-out", authed(post(endpoints::auth::sign_out)))
        .route("/auth/me", authed(get(endpoints::auth::me)))
        .route(
            "/auth/become-provider",
            authed(post(endpoints::auth::become_provider)),
        )
        .route("/me/professional", authed(put(endpoints::me::save_professional)))
        .route(
            "/assistant",
            get(endpoints::assistant::greeting).post(endpoints::assistant::reply),
        )
        .with_state(ctx.clone())
        // Middleware stack (innermost first, outermost last):
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        // Extension must wrap every middleware that extracts ApiContext
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", api)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
}

/// CORS for the browser front-end served from `origin`.
pub fn cors_layer(origin: &str) -> Option<CorsLayer> {
    let origin = match HeaderValue::from_str(origin) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(origin, error = %e, "Ignoring invalid CORS origin");
            return None;
        }
    };
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .max_age(std::time::Duration::from_secs(60 * 60)),
    )
}

/// Router plus CORS when an allowed origin is configured.
pub fn app(ctx: ApiContext, allowed_origin: Option<&str>) -> Router {
    let router = api_router(ctx);
    match allowed_origin.and_then(cors_layer) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}
