//! Marketplace data access: the operations the pages call.
//!
//! Reads never fail from the caller's point of view. A backend error is
//! logged and the read yields an empty list, `None` or `0`. The one
//! exception is a signed-in read whose access token was rejected: that
//! surfaces as [`BackendError::Unauthorized`] so the session can be ended.
//! Writes return [`MarketError`] so the caller can turn a failure into a
//! notice.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::{AuthSession, BackendError, MarketBackend, SignUpOutcome, SignUpRequest};
use crate::booking::{check_transition, BookingParty, TransitionError};
use crate::forms::{self, BookingForm, EmergencyForm, ProfessionalProfileForm, ServiceForm, ValidationErrors};
use crate::listing::aggregate_all;
use crate::models::*;

pub const FEATURED_LIMIT: u32 = 3;
pub const CATEGORY_PAGE_LIMIT: u32 = 20;
pub const TOP_LIMIT: u32 = 20;
/// Page size fetched by the browse page before in-memory filtering.
pub const BROWSE_LIMIT: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Not allowed: {0}")]
    Forbidden(&'static str),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type MarketResult<T> = Result<T, MarketError>;

/// Signed-in caller: their account id and backend access token.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub user_id: Uuid,
    pub auth: &'a str,
}

impl<'a> Actor<'a> {
    pub fn new(user_id: Uuid, auth: &'a str) -> Self {
        Self { user_id, auth }
    }
}

fn or_log<T: Default>(operation: &str, result: Result<T, BackendError>) -> T {
    result.unwrap_or_else(|e| {
        tracing::error!(operation, error = %e, "Backend read failed");
        T::default()
    })
}

/// [`or_log`] for reads made on behalf of a signed-in caller. A rejected
/// access token is passed through instead of becoming an empty result.
fn or_log_signed_in<T: Default>(operation: &str, result: Result<T, BackendError>) -> MarketResult<T> {
    match result {
        Err(BackendError::Unauthorized) => Err(BackendError::Unauthorized.into()),
        other => Ok(or_log(operation, other)),
    }
}

// ═══════════════════════════════════════════════════════════
// Listings
// ═══════════════════════════════════════════════════════════

fn listing(backend: &dyn MarketBackend, operation: &str, query: &ProfessionalQuery) -> Vec<ProfessionalWithProfile> {
    aggregate_all(or_log(operation, backend.list_professionals(query)))
}

pub fn get_featured_professionals(backend: &dyn MarketBackend, limit: u32) -> Vec<ProfessionalWithProfile> {
    listing(backend, "featured_professionals", &ProfessionalQuery::top(limit))
}

pub fn get_professionals_by_category(
    backend: &dyn MarketBackend,
    category: &str,
    limit: u32,
    offset: u32,
) -> Vec<ProfessionalWithProfile> {
    listing(
        backend,
        "professionals_by_category",
        &ProfessionalQuery::by_category(category, limit, offset),
    )
}

pub fn get_top_professionals(backend: &dyn MarketBackend, limit: u32) -> Vec<ProfessionalWithProfile> {
    listing(backend, "top_professionals", &ProfessionalQuery::top(limit))
}

pub fn get_total_professionals_count(backend: &dyn MarketBackend) -> u64 {
    or_log("professionals_count", backend.count_professionals())
}

pub fn get_professional(backend: &dyn MarketBackend, id: &Uuid) -> Option<ProfessionalWithProfile> {
    listing(backend, "professional", &ProfessionalQuery::by_id(*id))
        .into_iter()
        .next()
}

pub fn get_professional_services(backend: &dyn MarketBackend, professional_id: &Uuid) -> Vec<Service> {
    or_log("professional_services", backend.list_services(professional_id))
}

pub fn get_professional_reviews(backend: &dyn MarketBackend, professional_id: &Uuid) -> Vec<Review> {
    or_log("professional_reviews", backend.list_reviews(professional_id))
}

/// Add a service to the caller's own listing.
pub fn add_professional_service(
    backend: &dyn MarketBackend,
    actor: Actor<'_>,
    professional_id: &Uuid,
    form: &ServiceForm,
) -> MarketResult<Service> {
    if actor.user_id != *professional_id {
        return Err(MarketError::Forbidden("services can only be added to your own listing"));
    }
    let new = forms::validate_service(*professional_id, form)?;
    let service = backend.insert_service(actor.auth, &new)?;
    tracing::info!(service = %service.id, professional = %professional_id, "Service added");
    Ok(service)
}

// ═══════════════════════════════════════════════════════════
// Bookings
// ═══════════════════════════════════════════════════════════

pub fn get_professional_bookings(
    backend: &dyn MarketBackend,
    actor: Actor<'_>,
    professional_id: &Uuid,
) -> MarketResult<Vec<Booking>> {
    or_log_signed_in(
        "professional_bookings",
        backend.list_bookings(actor.auth, BookingScope::Professional(*professional_id)),
    )
}

pub fn get_client_bookings(backend: &dyn MarketBackend, actor: Actor<'_>) -> MarketResult<Vec<Booking>> {
    or_log_signed_in(
        "client_bookings",
        backend.list_bookings(actor.auth, BookingScope::Client(actor.user_id)),
    )
}

/// Book a service as the caller. The booking goes to the service's owner
/// and starts out pending.
pub fn create_booking(
    backend: &dyn MarketBackend,
    actor: Actor<'_>,
    form: &BookingForm,
    now: DateTime<Utc>,
) -> MarketResult<(Booking, Service)> {
    let booking_date = forms::validate_booking(form, now)?;
    let service = backend
        .get_service(&form.service_id)?
        .ok_or_else(|| MarketError::NotFound {
            entity: "Service",
            id: form.service_id.to_string(),
        })?;

    let booking = backend.insert_booking(
        actor.auth,
        &NewBooking {
            professional_id: service.professional_id,
            client_id: actor.user_id,
            service_id: service.id,
            booking_date,
            status: BookingStatus::Pending,
        },
    )?;
    tracing::info!(booking = %booking.id, service = %service.id, "Booking created");
    Ok((booking, service))
}

/// Move a booking along its workflow on behalf of one of its parties.
pub fn update_booking_status(
    backend: &dyn MarketBackend,
    actor: Actor<'_>,
    booking_id: &Uuid,
    next: BookingStatus,
) -> MarketResult<(Booking, BookingParty)> {
    let current = backend
        .get_booking(actor.auth, booking_id)?
        .ok_or_else(|| MarketError::NotFound {
            entity: "Booking",
            id: booking_id.to_string(),
        })?;
    let party = BookingParty::of(&current, &actor.user_id)
        .ok_or(MarketError::Forbidden("only the booking's client or professional can change it"))?;

    check_transition(party, current.status, next)?;
    let updated = backend.update_booking_status(actor.auth, booking_id, next)?;
    tracing::info!(
        booking = %booking_id,
        from = %current.status,
        to = %next,
        "Booking status changed"
    );
    Ok((updated, party))
}

// ═══════════════════════════════════════════════════════════
// Emergency SOS
// ═══════════════════════════════════════════════════════════

pub fn create_emergency_sos(
    backend: &dyn MarketBackend,
    actor: Actor<'_>,
    form: &EmergencyForm,
) -> MarketResult<EmergencySos> {
    let profile = backend.get_profile(actor.auth, &actor.user_id)?;
    forms::validate_emergency(form, profile.as_ref().and_then(|p| p.phone.as_deref()))?;

    let sos = backend.insert_emergency(
        actor.auth,
        &NewEmergencySos {
            client_id: actor.user_id,
            professional_id: None,
            location: form.location.trim().to_string(),
            description: form.description.trim().to_string(),
            status: EmergencyStatus::Active,
        },
    )?;
    tracing::warn!(sos = %sos.id, "Emergency SOS raised");
    Ok(sos)
}

pub fn get_client_emergencies(backend: &dyn MarketBackend, actor: Actor<'_>) -> MarketResult<Vec<EmergencySos>> {
    or_log_signed_in("client_emergencies", backend.list_emergencies(actor.auth, &actor.user_id))
}

// ═══════════════════════════════════════════════════════════
// Accounts and provider profile
// ═══════════════════════════════════════════════════════════

pub fn sign_in(backend: &dyn MarketBackend, email: &str, password: &str) -> MarketResult<AuthSession> {
    forms::validate_sign_in(email, password)?;
    Ok(backend.sign_in(email.trim(), password)?)
}

pub fn sign_up(backend: &dyn MarketBackend, request: &SignUpRequest) -> MarketResult<SignUpOutcome> {
    forms::validate_sign_up(
        &request.email,
        &request.password,
        &request.first_name,
        &request.last_name,
    )?;
    let outcome = backend.sign_up(request)?;
    tracing::info!(
        user = %outcome.user.id,
        provider = request.is_professional,
        confirmed = outcome.session.is_some(),
        "Account registered"
    );
    Ok(outcome)
}

pub fn get_own_profile(backend: &dyn MarketBackend, actor: Actor<'_>) -> MarketResult<Option<Profile>> {
    or_log_signed_in("own_profile", backend.get_profile(actor.auth, &actor.user_id))
}

/// Save the provider form: profile columns first, then the professional row.
pub fn save_professional_profile(
    backend: &dyn MarketBackend,
    actor: Actor<'_>,
    form: &ProfessionalProfileForm,
    now: DateTime<Utc>,
) -> MarketResult<(Profile, Professional)> {
    let validated = forms::validate_professional_profile(actor.user_id, form, now)?;
    let profile = backend.update_profile(actor.auth, &actor.user_id, &validated.profile)?;
    let professional = backend.upsert_professional(actor.auth, &validated.professional)?;
    tracing::info!(professional = %actor.user_id, "Professional profile saved");
    Ok((profile, professional))
}

/// Flag the caller as a provider and create a blank professional row if
/// they do not have one yet.
pub fn become_provider(backend: &dyn MarketBackend, actor: Actor<'_>, now: DateTime<Utc>) -> MarketResult<Profile> {
    let profile = backend.update_profile(
        actor.auth,
        &actor.user_id,
        &ProfileUpdate {
            is_professional: Some(true),
            updated_at: now,
            ..Default::default()
        },
    )?;
    if backend.get_professional(&actor.user_id)?.is_none() {
        backend.upsert_professional(actor.auth, &Professional::onboarding(actor.user_id))?;
    }
    tracing::info!(user = %actor.user_id, "User became a provider");
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalStore;
    use chrono::Duration;

    struct Fixture {
        store: LocalStore,
        pro_id: Uuid,
        pro_token: String,
        client_id: Uuid,
        client_token: String,
    }

    fn register(store: &LocalStore, email: &str, professional: bool, phone: Option<&str>) -> (Uuid, String) {
        let outcome = sign_up(
            store,
            &SignUpRequest {
                email: email.into(),
                password: "secret123".into(),
                first_name: "Sam".into(),
                last_name: "Lee".into(),
                phone: phone.map(String::from),
                is_professional: professional,
            },
        )
        .unwrap();
        let session = outcome.session.unwrap();
        (outcome.user.id, session.access_token)
    }

    fn fixture() -> Fixture {
        let store = LocalStore::in_memory().unwrap();
        let (pro_id, pro_token) = register(&store, "pro@example.com", true, Some("+15550001111"));
        let (client_id, client_token) = register(&store, "client@example.com", false, Some("+15550002222"));
        Fixture {
            store,
            pro_id,
            pro_token,
            client_id,
            client_token,
        }
    }

    fn service_form() -> ServiceForm {
        ServiceForm {
            title: "Leak repair".into(),
            description: "Find and fix a leaking pipe.".into(),
            price: 80.0,
            duration: None,
        }
    }

    fn booked(f: &Fixture) -> Booking {
        let service = add_professional_service(
            &f.store,
            Actor::new(f.pro_id, &f.pro_token),
            &f.pro_id,
            &service_form(),
        )
        .unwrap();
        let form = BookingForm {
            service_id: service.id,
            booking_date: Some(Utc::now() + Duration::days(2)),
            notes: None,
        };
        create_booking(&f.store, Actor::new(f.client_id, &f.client_token), &form, Utc::now())
            .unwrap()
            .0
    }

    #[test]
    fn service_defaults_duration_and_lists() {
        let f = fixture();
        let service = add_professional_service(
            &f.store,
            Actor::new(f.pro_id, &f.pro_token),
            &f.pro_id,
            &service_form(),
        )
        .unwrap();
        assert_eq!(service.duration, 60);
        let listed = get_professional_services(&f.store, &f.pro_id);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, service.id);
        assert_eq!(listed[0].title, "Leak repair");
    }

    #[test]
    fn service_on_someone_elses_listing_is_forbidden() {
        let f = fixture();
        let err = add_professional_service(
            &f.store,
            Actor::new(f.client_id, &f.client_token),
            &f.pro_id,
            &service_form(),
        )
        .unwrap_err();
        assert!(matches!(err, MarketError::Forbidden(_)));
    }

    #[test]
    fn invalid_service_reports_fields() {
        let f = fixture();
        let form = ServiceForm {
            title: "ab".into(),
            description: "short".into(),
            price: 0.0,
            duration: Some(0.0),
        };
        match add_professional_service(&f.store, Actor::new(f.pro_id, &f.pro_token), &f.pro_id, &form) {
            Err(MarketError::Validation(errors)) => {
                assert_eq!(errors.len(), 4);
                assert!(errors.get("price").is_some());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn booking_starts_pending_for_service_owner() {
        let f = fixture();
        let booking = booked(&f);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.professional_id, f.pro_id);
        assert_eq!(booking.client_id, f.client_id);

        let for_pro =
            get_professional_bookings(&f.store, Actor::new(f.pro_id, &f.pro_token), &f.pro_id).unwrap();
        assert_eq!(for_pro.len(), 1);
        let for_client = get_client_bookings(&f.store, Actor::new(f.client_id, &f.client_token)).unwrap();
        assert_eq!(for_client[0].id, booking.id);
    }

    #[test]
    fn booking_in_the_past_is_rejected() {
        let f = fixture();
        let form = BookingForm {
            service_id: Uuid::new_v4(),
            booking_date: Some(Utc::now() - Duration::hours(1)),
            notes: None,
        };
        let err = create_booking(&f.store, Actor::new(f.client_id, &f.client_token), &form, Utc::now())
            .unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));
    }

    #[test]
    fn booking_unknown_service_is_not_found() {
        let f = fixture();
        let form = BookingForm {
            service_id: Uuid::new_v4(),
            booking_date: Some(Utc::now() + Duration::days(1)),
            notes: None,
        };
        let err = create_booking(&f.store, Actor::new(f.client_id, &f.client_token), &form, Utc::now())
            .unwrap_err();
        assert!(matches!(err, MarketError::NotFound { entity: "Service", .. }));
    }

    #[test]
    fn status_workflow_is_enforced_per_party() {
        let f = fixture();
        let booking = booked(&f);
        let client = Actor::new(f.client_id, &f.client_token);
        let pro = Actor::new(f.pro_id, &f.pro_token);

        let err = update_booking_status(&f.store, client, &booking.id, BookingStatus::Confirmed).unwrap_err();
        assert!(matches!(err, MarketError::Transition(TransitionError::ProfessionalOnly(_))));

        let (confirmed, party) = update_booking_status(&f.store, pro, &booking.id, BookingStatus::Confirmed).unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(party, BookingParty::Professional);

        let (cancelled, _) = update_booking_status(&f.store, client, &booking.id, BookingStatus::Cancelled).unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let err = update_booking_status(&f.store, pro, &booking.id, BookingStatus::Completed).unwrap_err();
        assert!(matches!(err, MarketError::Transition(TransitionError::NotAllowed { .. })));
    }

    #[test]
    fn outsider_cannot_touch_booking() {
        let f = fixture();
        let booking = booked(&f);
        let (other_id, other_token) = register(&f.store, "other@example.com", false, None);
        let err = update_booking_status(
            &f.store,
            Actor::new(other_id, &other_token),
            &booking.id,
            BookingStatus::Cancelled,
        )
        .unwrap_err();
        assert!(matches!(err, MarketError::Forbidden(_)));
    }

    #[test]
    fn emergency_requires_profile_phone() {
        let f = fixture();
        let (no_phone_id, no_phone_token) = register(&f.store, "nophone@example.com", false, None);
        let form = EmergencyForm {
            location: "12 Main St".into(),
            description: "Burst pipe in kitchen".into(),
        };
        match create_emergency_sos(&f.store, Actor::new(no_phone_id, &no_phone_token), &form) {
            Err(MarketError::Validation(errors)) => assert!(errors.get("phone").is_some()),
            other => panic!("expected validation error, got {other:?}"),
        }

        let client = Actor::new(f.client_id, &f.client_token);
        let sos = create_emergency_sos(&f.store, client, &form).unwrap();
        assert_eq!(sos.status, EmergencyStatus::Active);
        assert!(sos.professional_id.is_none());
        assert_eq!(get_client_emergencies(&f.store, client).unwrap().len(), 1);
    }

    #[test]
    fn become_provider_keeps_existing_row() {
        let f = fixture();
        let client = Actor::new(f.client_id, &f.client_token);
        let profile = become_provider(&f.store, client, Utc::now()).unwrap();
        assert!(profile.is_professional);
        let row = f.store.get_professional(&f.client_id).unwrap().unwrap();
        assert_eq!(row.category, "other");

        let form = ProfessionalProfileForm {
            hourly_rate: "65".into(),
            years_experience: "8".into(),
            category: "electrical".into(),
            availability: "Weekdays".into(),
            bio: "Licensed electrician for homes.".into(),
            location: "Austin, TX".into(),
            first_name: "Sam".into(),
            last_name: "Lee".into(),
            phone: "+15550002222".into(),
            specialties: vec!["Wiring".into(), " Wiring ".into()],
            emergency_available: true,
            daily_pay_available: false,
        };
        save_professional_profile(&f.store, client, &form, Utc::now()).unwrap();

        become_provider(&f.store, client, Utc::now()).unwrap();
        let row = f.store.get_professional(&f.client_id).unwrap().unwrap();
        assert_eq!(row.category, "electrical");
        assert_eq!(row.specialties, vec!["Wiring".to_string()]);
    }

    #[test]
    fn listings_aggregate_and_count() {
        let f = fixture();
        assert_eq!(get_total_professionals_count(&f.store), 1);
        let featured = get_featured_professionals(&f.store, FEATURED_LIMIT);
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].review_count, 0);
        assert!(featured[0].avg_rating.is_none());
        assert!(get_professional(&f.store, &f.pro_id).is_some());
        assert!(get_professional(&f.store, &Uuid::new_v4()).is_none());
        assert!(get_professionals_by_category(&f.store, "plumbing", CATEGORY_PAGE_LIMIT, 0).is_empty());
        assert_eq!(get_professionals_by_category(&f.store, "other", CATEGORY_PAGE_LIMIT, 0).len(), 1);
    }

    #[test]
    fn scoped_read_with_stale_token_reports_unauthorized() {
        let f = fixture();
        booked(&f);
        let stale = Actor::new(f.client_id, "stale");
        assert!(matches!(
            get_client_bookings(&f.store, stale),
            Err(MarketError::Backend(BackendError::Unauthorized))
        ));
        assert!(matches!(
            get_own_profile(&f.store, stale),
            Err(MarketError::Backend(BackendError::Unauthorized))
        ));
        assert!(matches!(
            get_client_emergencies(&f.store, stale),
            Err(MarketError::Backend(BackendError::Unauthorized))
        ));
    }

    #[test]
    fn sign_in_validates_before_calling_backend() {
        let f = fixture();
        assert!(matches!(sign_in(&f.store, "not-an-email", "x"), Err(MarketError::Validation(_))));
        assert!(matches!(
            sign_in(&f.store, "client@example.com", "wrong-password"),
            Err(MarketError::Backend(BackendError::InvalidCredentials))
        ));
        assert!(sign_in(&f.store, "client@example.com", "secret123").is_ok());
    }
}
