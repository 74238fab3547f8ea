pub mod booking;
pub mod emergency;
pub mod enums;
pub mod filters;
pub mod professional;
pub mod profile;
pub mod project;
pub mod review;
pub mod service;

pub use booking::*;
pub use emergency::*;
pub use enums::*;
pub use filters::*;
pub use professional::*;
pub use profile::*;
pub use project::*;
pub use review::*;
pub use service::*;

use serde::{Deserialize, Deserializer};

/// The backend reports nullable booleans and arrays; treat `null` as the default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn professional_row_decodes_backend_listing() {
        let json = r#"{
            "id": "6f1c2f7a-2a55-4a1e-9a53-0c1f4d3c8b11",
            "category": "plumbing",
            "hourly_rate": 75,
            "years_experience": 15,
            "availability": "Available now",
            "verification_badge": null,
            "specialties": null,
            "emergency_available": true,
            "daily_pay_available": null,
            "profile": {"first_name": "Alex", "last_name": "Rivera", "avatar_url": null,
                        "location": "San Francisco, CA", "bio": null, "phone": "+15550001111"},
            "avg_rating": [{"rating": 5}, {"rating": 4}],
            "projects": []
        }"#;

        let row: ProfessionalRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.professional.category, "plumbing");
        assert_eq!(row.professional.hourly_rate, Some(75.0));
        assert!(!row.professional.verification_badge);
        assert!(row.professional.specialties.is_empty());
        assert!(row.professional.emergency_available);
        assert_eq!(row.ratings.len(), 2);
        assert_eq!(row.profile.unwrap().display_name(), "Alex Rivera");
    }

    #[test]
    fn booking_decodes_with_embedded_client() {
        let json = r#"{
            "id": "0b6f7bde-7b8b-4d7e-a2a4-3fd1f1b0e001",
            "professional_id": "0b6f7bde-7b8b-4d7e-a2a4-3fd1f1b0e002",
            "client_id": "0b6f7bde-7b8b-4d7e-a2a4-3fd1f1b0e003",
            "service_id": "0b6f7bde-7b8b-4d7e-a2a4-3fd1f1b0e004",
            "booking_date": "2026-11-02T15:00:00+00:00",
            "status": "confirmed",
            "created_at": "2026-10-01T09:30:00+00:00",
            "client": {"first_name": "Mary", "last_name": null, "location": null, "phone": null}
        }"#;

        let booking: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.client.unwrap().first_name.as_deref(), Some("Mary"));
    }

    #[test]
    fn display_name_renders_missing_parts_empty() {
        let summary = ProfileSummary {
            first_name: Some("Mary".into()),
            ..Default::default()
        };
        assert_eq!(summary.display_name(), "Mary ");
        assert!(!summary.has_phone());
    }
}
