//! Form validation. Each validator returns the cleaned payload or the
//! per-field messages shown under the inputs.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{NewService, Professional, ProfileUpdate};

pub const DEFAULT_SERVICE_DURATION: i32 = 60;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_PHONE_LEN: usize = 10;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Field name → first message for that field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message unless the field already has one.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// First message, used as a notice description.
    pub fn first_message(&self) -> Option<&str> {
        self.fields.values().next().map(String::as_str)
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined: Vec<String> = self
            .fields
            .iter()
            .map(|(field, msg)| format!("{field}: {msg}"))
            .collect();
        f.write_str(&joined.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

// ═══════════════════════════════════════════════════════════
// Service
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceForm {
    pub title: String,
    pub description: String,
    pub price: f64,
    /// Minutes; defaults to an hour.
    #[serde(default)]
    pub duration: Option<f64>,
}

pub fn validate_service(professional_id: Uuid, form: &ServiceForm) -> Result<NewService, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let title_len = form.title.chars().count();
    if title_len < 3 {
        errors.add("title", "Service title must be at least 3 characters.");
    } else if title_len > 100 {
        errors.add("title", "Service title must be at most 100 characters.");
    }

    let description_len = form.description.chars().count();
    if description_len < 10 {
        errors.add("description", "Description must be at least 10 characters.");
    } else if description_len > 500 {
        errors.add("description", "Description must be at most 500 characters.");
    }

    if !(form.price.is_finite() && form.price > 0.0) {
        errors.add("price", "Price must be a positive number.");
    }

    let duration = form.duration.unwrap_or(f64::from(DEFAULT_SERVICE_DURATION));
    if !(duration.is_finite() && duration > 0.0 && duration.fract() == 0.0 && duration <= f64::from(i32::MAX)) {
        errors.add("duration", "Duration must be a positive number in minutes.");
    }

    errors.finish(NewService {
        professional_id,
        title: form.title.clone(),
        description: form.description.clone(),
        price: form.price,
        duration: duration as i32,
    })
}

// ═══════════════════════════════════════════════════════════
// Booking
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct BookingForm {
    pub service_id: Uuid,
    #[serde(default)]
    pub booking_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Returns the requested date when it is present and not in the past.
pub fn validate_booking(form: &BookingForm, now: DateTime<Utc>) -> Result<DateTime<Utc>, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    match form.booking_date {
        None => errors.add("booking_date", "Please select a date and time"),
        Some(date) if date < now => errors.add("booking_date", "Booking date cannot be in the past"),
        Some(_) => {}
    }
    errors.finish(form.booking_date.unwrap_or(now))
}

// ═══════════════════════════════════════════════════════════
// Emergency SOS
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct EmergencyForm {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
}

/// Location and description must be filled in, and the requester must have
/// a phone number on file so a professional can call back.
pub fn validate_emergency(form: &EmergencyForm, profile_phone: Option<&str>) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if blank(&form.location) {
        errors.add("location", "Please provide your location and describe the emergency");
    }
    if blank(&form.description) {
        errors.add("description", "Please provide your location and describe the emergency");
    }
    if profile_phone.map_or(true, blank) {
        errors.add(
            "phone",
            "Please add a phone number to your profile so professionals can reach you",
        );
    }
    errors.finish(())
}

// ═══════════════════════════════════════════════════════════
// Professional profile
// ═══════════════════════════════════════════════════════════

/// Raw professional-profile form. Numeric fields arrive as text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfessionalProfileForm {
    #[serde(default)]
    pub hourly_rate: String,
    #[serde(default)]
    pub years_experience: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub emergency_available: bool,
    #[serde(default)]
    pub daily_pay_available: bool,
}

/// Validated form split into its profile and professional halves.
#[derive(Debug, Clone)]
pub struct ProfessionalProfile {
    pub profile: ProfileUpdate,
    pub professional: Professional,
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn validate_professional_profile(
    user_id: Uuid,
    form: &ProfessionalProfileForm,
    now: DateTime<Utc>,
) -> Result<ProfessionalProfile, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let rate = parse_number(&form.hourly_rate);
    match rate {
        None => errors.add("hourly_rate", "Hourly rate must be a number"),
        Some(r) if r <= 0.0 => errors.add("hourly_rate", "Hourly rate must be greater than 0"),
        Some(_) => {}
    }

    let years = if blank(&form.years_experience) {
        None
    } else {
        match parse_number(&form.years_experience) {
            Some(y) if y >= 0.0 && y <= f64::from(i32::MAX) => Some(y.trunc() as i32),
            _ => {
                errors.add("years_experience", "Years of experience must be a number");
                None
            }
        }
    };

    if blank(&form.category) {
        errors.add("category", "Please select a category");
    }
    if blank(&form.availability) {
        errors.add("availability", "Please specify your availability");
    }
    if form.bio.chars().count() < 10 {
        errors.add("bio", "Bio must be at least 10 characters");
    }
    if blank(&form.location) {
        errors.add("location", "Please enter your location");
    }
    if blank(&form.first_name) {
        errors.add("first_name", "Please enter your first name");
    }
    if blank(&form.last_name) {
        errors.add("last_name", "Please enter your last name");
    }
    if form.phone.chars().count() < MIN_PHONE_LEN {
        errors.add("phone", "Please enter a valid phone number");
    }

    let validated = ProfessionalProfile {
        profile: ProfileUpdate {
            first_name: Some(form.first_name.clone()),
            last_name: Some(form.last_name.clone()),
            phone: Some(form.phone.clone()),
            bio: Some(form.bio.clone()),
            location: Some(form.location.clone()),
            is_professional: Some(true),
            updated_at: now,
        },
        professional: Professional {
            id: user_id,
            category: form.category.clone(),
            hourly_rate: rate,
            years_experience: years,
            availability: Some(form.availability.clone()),
            verification_badge: false,
            specialties: normalize_specialties(&form.specialties),
            emergency_available: form.emergency_available,
            daily_pay_available: form.daily_pay_available,
        },
    };
    errors.finish(validated)
}

/// Add a specialty to the list. Returns false when it is blank or already present.
pub fn add_specialty(specialties: &mut Vec<String>, candidate: &str) -> bool {
    let trimmed = candidate.trim();
    if trimmed.is_empty() || specialties.iter().any(|s| s == trimmed) {
        return false;
    }
    specialties.push(trimmed.to_string());
    true
}

pub fn remove_specialty(specialties: &mut Vec<String>, specialty: &str) {
    specialties.retain(|s| s != specialty);
}

/// Trimmed, non-empty, first occurrence kept.
pub fn normalize_specialties(raw: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for s in raw {
        add_specialty(&mut out, s);
    }
    out
}

// ═══════════════════════════════════════════════════════════
// Auth
// ═══════════════════════════════════════════════════════════

pub fn validate_sign_up(
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if !EMAIL_PATTERN.is_match(email.trim()) {
        errors.add("email", "Please enter a valid email address");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add("password", "Password must be at least 6 characters");
    }
    if blank(first_name) {
        errors.add("first_name", "Please enter your first name");
    }
    if blank(last_name) {
        errors.add("last_name", "Please enter your last name");
    }
    errors.finish(())
}

pub fn validate_sign_in(email: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if !EMAIL_PATTERN.is_match(email.trim()) {
        errors.add("email", "Please enter a valid email address");
    }
    if password.is_empty() {
        errors.add("password", "Please enter your password");
    }
    errors.finish(())
}
