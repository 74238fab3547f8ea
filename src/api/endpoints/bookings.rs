//! Booking endpoints (signed-in users).
//!
//! - `GET /api/bookings`: the caller's bookings as a client
//! - `POST /api/bookings`: book a service
//! - `POST /api/bookings/:id/status`: move a booking along its workflow

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::endpoints::professionals::BookingsResponse;
use crate::api::error::{mutation_failed, ApiError};
use crate::api::types::{ApiContext, UserContext};
use crate::booking::{BookingParty, BookingView};
use crate::forms::BookingForm;
use crate::marketplace;
use crate::models::BookingStatus;
use crate::notice::Notice;

/// `GET /api/bookings`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<BookingsResponse>, ApiError> {
    let bookings = ctx
        .blocking(move |backend| marketplace::get_client_bookings(backend, user.actor()))
        .await??;

    Ok(Json(BookingsResponse {
        bookings: bookings
            .into_iter()
            .map(|b| BookingView::for_party(b, BookingParty::Client))
            .collect(),
    }))
}

#[derive(Serialize)]
pub struct BookingResponse {
    pub booking: BookingView,
    pub notice: Notice,
}

/// `POST /api/bookings`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Json(form): Json<BookingForm>,
) -> Result<Json<BookingResponse>, ApiError> {
    let (booking, service) = ctx
        .blocking(move |backend| {
            marketplace::create_booking(backend, user.actor(), &form, Utc::now())
        })
        .await?
        .map_err(|e| mutation_failed(e, Notice::booking_failed()))?;

    Ok(Json(BookingResponse {
        booking: BookingView::for_party(booking, BookingParty::Client),
        notice: Notice::booking_submitted(&service.title),
    }))
}

#[derive(Deserialize)]
pub struct StatusChange {
    pub status: BookingStatus,
}

/// `POST /api/bookings/:id/status`
pub async fn update_status(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
    Json(change): Json<StatusChange>,
) -> Result<Json<BookingResponse>, ApiError> {
    let (booking, party) = ctx
        .blocking(move |backend| {
            marketplace::update_booking_status(backend, user.actor(), &id, change.status)
        })
        .await?
        .map_err(|e| mutation_failed(e, Notice::booking_failed()))?;

    let notice = Notice::booking_updated(booking.status.as_str());
    Ok(Json(BookingResponse {
        booking: BookingView::for_party(booking, party),
        notice,
    }))
}
