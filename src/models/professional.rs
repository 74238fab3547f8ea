use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::ProfileSummary;
use super::project::Project;
use super::review::RatingOnly;

/// A row of the `professionals` table. `id` is the owning profile's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Professional {
    pub id: Uuid,
    pub category: String,
    pub hourly_rate: Option<f64>,
    pub years_experience: Option<i32>,
    pub availability: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub verification_badge: bool,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub specialties: Vec<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub emergency_available: bool,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub daily_pay_available: bool,
}

impl Professional {
    /// Blank provider record created when a user opts in as a provider.
    pub fn onboarding(id: Uuid) -> Self {
        Self {
            id,
            category: "other".into(),
            hourly_rate: Some(0.0),
            years_experience: None,
            availability: None,
            verification_badge: false,
            specialties: Vec::new(),
            emergency_available: false,
            daily_pay_available: false,
        }
    }
}

/// Raw listing row as returned by the backend: professional columns with
/// the profile, review ratings and projects embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessionalRow {
    #[serde(flatten)]
    pub professional: Professional,
    #[serde(default)]
    pub profile: Option<ProfileSummary>,
    #[serde(default, rename = "avg_rating")]
    pub ratings: Vec<RatingOnly>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

/// Listing view model with ratings aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessionalWithProfile {
    #[serde(flatten)]
    pub professional: Professional,
    pub profile: ProfileSummary,
    pub avg_rating: Option<f64>,
    pub review_count: usize,
    pub featured_project: Option<Project>,
}
