//! User-facing toasts returned beside mutation results.

use serde::Serialize;

use crate::models::NoticeVariant;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Default,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Destructive,
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.variant == NoticeVariant::Destructive
    }

    // ── Auth ─────────────────────────────────────────────

    pub fn signed_in() -> Self {
        Self::info("Successfully signed in", "Welcome back!")
    }

    pub fn sign_in_failed(reason: &str) -> Self {
        Self::destructive("Error signing in", reason)
    }

    pub fn registered(awaiting_confirmation: bool, is_professional: bool) -> Self {
        let description = match (awaiting_confirmation, is_professional) {
            (true, true) => "Please check your email to confirm your account. After confirmation, you'll be ready to offer your services!",
            (true, false) => "Please check your email to confirm your account.",
            (false, true) => "Your account is ready. You can now offer your services!",
            (false, false) => "Your account is ready.",
        };
        Self::info("Registration successful", description)
    }

    pub fn sign_up_failed(reason: &str) -> Self {
        Self::destructive("Error signing up", reason)
    }

    pub fn signed_out() -> Self {
        Self::info("Signed out", "You have been successfully signed out.")
    }

    pub fn became_provider() -> Self {
        Self::info("Success!", "You are now registered as a service provider.")
    }

    pub fn login_required(action: &str) -> Self {
        Self::destructive("Authentication required", format!("Please log in to {action}"))
    }

    // ── Marketplace ──────────────────────────────────────

    pub fn booking_submitted(service_title: &str) -> Self {
        Self::info(
            "Booking successful",
            format!("Your booking for {service_title} has been submitted."),
        )
    }

    pub fn booking_failed() -> Self {
        Self::destructive(
            "Booking failed",
            "There was an error booking this service. Please try again.",
        )
    }

    pub fn booking_updated(label: &str) -> Self {
        Self::info("Booking updated", format!("The booking is now {label}."))
    }

    pub fn service_added() -> Self {
        Self::info("Service added", "Your service has been added successfully.")
    }

    pub fn service_failed() -> Self {
        Self::destructive("Error", "There was an error adding your service. Please try again.")
    }

    pub fn emergency_sent() -> Self {
        Self::info(
            "Emergency SOS Sent",
            "Your emergency request has been submitted. Available professionals will be notified.",
        )
    }

    pub fn emergency_failed() -> Self {
        Self::destructive(
            "Error",
            "There was an error sending your emergency request. Please try again.",
        )
    }

    pub fn missing_information(description: &str) -> Self {
        Self::destructive("Missing information", description)
    }

    pub fn profile_updated() -> Self {
        Self::info(
            "Profile updated",
            "Your professional profile has been successfully updated.",
        )
    }

    pub fn profile_failed() -> Self {
        Self::destructive(
            "Error",
            "There was an error updating your profile. Please try again.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_notice_names_service() {
        let notice = Notice::booking_submitted("Leak repair");
        assert_eq!(notice.description, "Your booking for Leak repair has been submitted.");
        assert!(!notice.is_destructive());
    }

    #[test]
    fn failures_are_destructive() {
        for notice in [
            Notice::booking_failed(),
            Notice::service_failed(),
            Notice::emergency_failed(),
            Notice::profile_failed(),
            Notice::sign_in_failed("Invalid login credentials"),
            Notice::login_required("book a service"),
        ] {
            assert!(notice.is_destructive(), "{} should be destructive", notice.title);
        }
    }

    #[test]
    fn registration_text_depends_on_confirmation() {
        assert_eq!(
            Notice::registered(true, false).description,
            "Please check your email to confirm your account."
        );
        assert!(Notice::registered(true, true).description.contains("offer your services"));
    }

    #[test]
    fn serializes_variant_lowercase() {
        let json = serde_json::to_value(Notice::emergency_sent()).unwrap();
        assert_eq!(json["variant"], "default");
        assert_eq!(json["title"], "Emergency SOS Sent");
    }
}
