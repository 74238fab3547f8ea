//! Professional endpoints.
//!
//! Public:
//! - `GET /api/professionals`: browse page, top listings filtered in memory
//! - `GET /api/professionals/featured`: home page strip
//! - `GET /api/professionals/count`: total listings
//! - `GET /api/professionals/:id`: profile page
//! - `GET /api/professionals/:id/services`
//!
//! Owner only:
//! - `POST /api/professionals/:id/services`
//! - `GET /api/professionals/:id/bookings`

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::{mutation_failed, ApiError};
use crate::api::types::{ApiContext, UserContext};
use crate::booking::{BookingParty, BookingView};
use crate::forms::ServiceForm;
use crate::listing::{apply_filter, FilterOutcome};
use crate::marketplace::{self, BROWSE_LIMIT, FEATURED_LIMIT};
use crate::models::{ProfessionalFilter, ProfessionalWithProfile, Review, Service};
use crate::notice::Notice;

/// `GET /api/professionals?search&category&price&phone&emergency&daily_pay`
pub async fn browse(
    State(ctx): State<ApiContext>,
    Query(filter): Query<ProfessionalFilter>,
) -> Result<Json<FilterOutcome>, ApiError> {
    let fetched = ctx
        .blocking(|backend| marketplace::get_top_professionals(backend, BROWSE_LIMIT))
        .await?;
    Ok(Json(apply_filter(fetched, &filter)))
}

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct ListingResponse {
    pub professionals: Vec<ProfessionalWithProfile>,
}

/// `GET /api/professionals/featured?limit`
pub async fn featured(
    State(ctx): State<ApiContext>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ListingResponse>, ApiError> {
    let limit = query.limit.unwrap_or(FEATURED_LIMIT).clamp(1, BROWSE_LIMIT);
    let professionals = ctx
        .blocking(move |backend| marketplace::get_featured_professionals(backend, limit))
        .await?;
    Ok(Json(ListingResponse { professionals }))
}

#[derive(Serialize)]
pub struct CountResponse {
    pub total: u64,
}

/// `GET /api/professionals/count`
pub async fn count(State(ctx): State<ApiContext>) -> Result<Json<CountResponse>, ApiError> {
    let total = ctx
        .blocking(marketplace::get_total_professionals_count)
        .await?;
    Ok(Json(CountResponse { total }))
}

#[derive(Serialize)]
pub struct ProfessionalPage {
    pub professional: ProfessionalWithProfile,
    pub services: Vec<Service>,
    pub reviews: Vec<Review>,
}

/// `GET /api/professionals/:id`: listing, services and reviews.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfessionalPage>, ApiError> {
    let page = ctx
        .blocking(move |backend| {
            marketplace::get_professional(backend, &id).map(|professional| ProfessionalPage {
                professional,
                services: marketplace::get_professional_services(backend, &id),
                reviews: marketplace::get_professional_reviews(backend, &id),
            })
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("Professional not found".into()))?;
    Ok(Json(page))
}

#[derive(Serialize)]
pub struct ServicesResponse {
    pub services: Vec<Service>,
}

/// `GET /api/professionals/:id/services`
pub async fn services(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ServicesResponse>, ApiError> {
    let services = ctx
        .blocking(move |backend| marketplace::get_professional_services(backend, &id))
        .await?;
    Ok(Json(ServicesResponse { services }))
}

#[derive(Serialize)]
pub struct ServiceAdded {
    pub service: Service,
    pub notice: Notice,
}

/// `POST /api/professionals/:id/services`: owner adds a service.
pub async fn add_service(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
    Json(form): Json<ServiceForm>,
) -> Result<Json<ServiceAdded>, ApiError> {
    let service = ctx
        .blocking(move |backend| {
            marketplace::add_professional_service(backend, user.actor(), &id, &form)
        })
        .await?
        .map_err(|e| mutation_failed(e, Notice::service_failed()))?;

    Ok(Json(ServiceAdded {
        service,
        notice: Notice::service_added(),
    }))
}

#[derive(Serialize)]
pub struct BookingsResponse {
    pub bookings: Vec<BookingView>,
}

/// `GET /api/professionals/:id/bookings`: the owner's incoming bookings.
pub async fn bookings(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingsResponse>, ApiError> {
    if user.user_id != id {
        return Err(ApiError::Forbidden(
            "bookings are only visible to their professional".into(),
        ));
    }
    let bookings = ctx
        .blocking(move |backend| marketplace::get_professional_bookings(backend, user.actor(), &id))
        .await??;

    Ok(Json(BookingsResponse {
        bookings: bookings
            .into_iter()
            .map(|b| BookingView::for_party(b, BookingParty::Professional))
            .collect(),
    }))
}
