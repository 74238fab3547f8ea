//! Data backend seam.
//!
//! Every read and write of marketplace data goes through [`MarketBackend`].
//! Two implementations exist:
//! - [`RestBackend`]: the managed backend (PostgREST tables + auth endpoints)
//! - [`LocalStore`]: a SQLite mirror of the same schema, used offline and in tests
//!
//! The trait is synchronous. Async callers run it on the blocking pool.
//! Methods that touch user-owned rows take the caller's backend access
//! token (`auth`), which the managed backend needs for row-level security.

pub mod local;
pub mod rest;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

pub use local::LocalStore;
pub use rest::RestBackend;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Cannot reach backend at {0}")]
    Connection(String),
    #[error("HTTP client error: {0}")]
    Http(String),
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Response parsing failed: {0}")]
    ResponseParsing(String),
    #[error("Invalid login credentials")]
    InvalidCredentials,
    #[error("User already registered: {0}")]
    AccountExists(String),
    #[error("Session missing or expired")]
    Unauthorized,
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("Store lock poisoned")]
    LockPoisoned,
}

impl BackendError {
    /// Message safe to show to an end user.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::InvalidCredentials => "Invalid login credentials".into(),
            BackendError::AccountExists(_) => "User already registered".into(),
            BackendError::Unauthorized => "Your session has expired. Please sign in again.".into(),
            BackendError::NotFound { entity, .. } => format!("{entity} not found"),
            BackendError::Connection(_) => "The service is unreachable. Please try again.".into(),
            _ => "Something went wrong. Please try again.".into(),
        }
    }
}

/// Authenticated user as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Result of a successful password sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

/// Registration payload. Name, phone and the provider flag travel as user
/// metadata and seed the profile row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_professional: bool,
}

/// Registration result. The managed backend withholds the session until
/// the email address is confirmed.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<AuthSession>,
}

pub trait MarketBackend: Send + Sync {
    /// Short label for health output ("remote" / "local").
    fn kind(&self) -> &'static str;

    // ── Auth ─────────────────────────────────────────────

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError>;

    fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, BackendError>;

    fn sign_out(&self, auth: &str) -> Result<(), BackendError>;

    /// Exchange a refresh token for a new session. A rejected refresh
    /// token is [`BackendError::Unauthorized`].
    fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError>;

    // ── Public reads ─────────────────────────────────────

    fn list_professionals(
        &self,
        query: &ProfessionalQuery,
    ) -> Result<Vec<ProfessionalRow>, BackendError>;

    fn count_professionals(&self) -> Result<u64, BackendError>;

    fn get_professional(&self, id: &Uuid) -> Result<Option<Professional>, BackendError>;

    fn list_services(&self, professional_id: &Uuid) -> Result<Vec<Service>, BackendError>;

    fn get_service(&self, id: &Uuid) -> Result<Option<Service>, BackendError>;

    fn list_reviews(&self, professional_id: &Uuid) -> Result<Vec<Review>, BackendError>;

    // ── User-scoped ──────────────────────────────────────

    fn get_profile(&self, auth: &str, id: &Uuid) -> Result<Option<Profile>, BackendError>;

    fn update_profile(
        &self,
        auth: &str,
        id: &Uuid,
        update: &ProfileUpdate,
    ) -> Result<Profile, BackendError>;

    /// Insert the professional row, or overwrite its editable columns.
    fn upsert_professional(
        &self,
        auth: &str,
        professional: &Professional,
    ) -> Result<Professional, BackendError>;

    fn insert_service(&self, auth: &str, service: &NewService) -> Result<Service, BackendError>;

    fn list_bookings(&self, auth: &str, scope: BookingScope) -> Result<Vec<Booking>, BackendError>;

    fn get_booking(&self, auth: &str, id: &Uuid) -> Result<Option<Booking>, BackendError>;

    fn insert_booking(&self, auth: &str, booking: &NewBooking) -> Result<Booking, BackendError>;

    fn update_booking_status(
        &self,
        auth: &str,
        id: &Uuid,
        status: BookingStatus,
    ) -> Result<Booking, BackendError>;

    fn insert_emergency(
        &self,
        auth: &str,
        sos: &NewEmergencySos,
    ) -> Result<EmergencySos, BackendError>;

    fn list_emergencies(
        &self,
        auth: &str,
        client_id: &Uuid,
    ) -> Result<Vec<EmergencySos>, BackendError>;
}
