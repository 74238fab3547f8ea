//! Professional listings: rating aggregation and the in-memory filter chain
//! applied to an already-fetched page.

use serde::Serialize;

use crate::models::*;

/// Upper bound of the `low` price band (inclusive).
pub const LOW_RATE_MAX: f64 = 50.0;
/// Upper bound of the `medium` price band (inclusive).
pub const MEDIUM_RATE_MAX: f64 = 100.0;

/// Mean of the ratings, `None` when there are none.
pub fn average_rating(ratings: &[RatingOnly]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(r.rating)).sum();
    Some(sum as f64 / ratings.len() as f64)
}

/// Turn a raw backend row into the listing view model. The featured project
/// is the first project flagged as featured.
pub fn aggregate(row: ProfessionalRow) -> ProfessionalWithProfile {
    let avg_rating = average_rating(&row.ratings);
    let review_count = row.ratings.len();
    let featured_project = row.projects.into_iter().find(|p| p.is_featured);

    ProfessionalWithProfile {
        professional: row.professional,
        profile: row.profile.unwrap_or_default(),
        avg_rating,
        review_count,
        featured_project,
    }
}

pub fn aggregate_all(rows: Vec<ProfessionalRow>) -> Vec<ProfessionalWithProfile> {
    rows.into_iter().map(aggregate).collect()
}

/// Band of an hourly rate. A missing rate counts as 0.
pub fn price_band(hourly_rate: Option<f64>) -> PriceRange {
    let rate = hourly_rate.unwrap_or(0.0);
    if rate <= LOW_RATE_MAX {
        PriceRange::Low
    } else if rate <= MEDIUM_RATE_MAX {
        PriceRange::Medium
    } else {
        PriceRange::High
    }
}

impl ProfessionalFilter {
    /// All active predicates, AND-ed.
    pub fn matches(&self, pro: &ProfessionalWithProfile) -> bool {
        self.matches_search(pro)
            && self.matches_category(pro)
            && self.matches_price(pro)
            // A blank or whitespace-only phone counts as no phone.
            && (!self.phone || pro.profile.has_phone())
            && (!self.emergency || pro.professional.emergency_available)
            && (!self.daily_pay || pro.professional.daily_pay_available)
    }

    /// Surrounding whitespace in the term is ignored, so a padded term still
    /// matches and a whitespace-only term matches everyone.
    fn matches_search(&self, pro: &ProfessionalWithProfile) -> bool {
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => pro
                .profile
                .display_name()
                .to_lowercase()
                .contains(&term.to_lowercase()),
        }
    }

    fn matches_category(&self, pro: &ProfessionalWithProfile) -> bool {
        match self.category.as_deref() {
            None | Some("") | Some("all") => true,
            Some(category) => pro.professional.category == category,
        }
    }

    fn matches_price(&self, pro: &ProfessionalWithProfile) -> bool {
        self.price
            .map_or(true, |band| price_band(pro.professional.hourly_rate) == band)
    }

    /// Whether any predicate is active.
    pub fn is_active(&self) -> bool {
        self.search.as_deref().is_some_and(|s| !s.trim().is_empty())
            || self.category.as_deref().is_some_and(|c| !c.is_empty() && c != "all")
            || self.price.is_some()
            || self.phone
            || self.emergency
            || self.daily_pay
    }
}

/// Filtered listing plus the counts shown as "Showing X of Y".
#[derive(Debug, Clone, Serialize)]
pub struct FilterOutcome {
    pub professionals: Vec<ProfessionalWithProfile>,
    pub shown: usize,
    pub total: usize,
}

pub fn apply_filter(
    professionals: Vec<ProfessionalWithProfile>,
    filter: &ProfessionalFilter,
) -> FilterOutcome {
    let total = professionals.len();
    let professionals: Vec<_> = professionals
        .into_iter()
        .filter(|p| filter.matches(p))
        .collect();

    FilterOutcome {
        shown: professionals.len(),
        total,
        professionals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn pro(first: Option<&str>, last: Option<&str>, category: &str, rate: Option<f64>) -> ProfessionalWithProfile {
        ProfessionalWithProfile {
            professional: Professional {
                id: Uuid::new_v4(),
                category: category.into(),
                hourly_rate: rate,
                years_experience: Some(5),
                availability: None,
                verification_badge: false,
                specialties: vec![],
                emergency_available: false,
                daily_pay_available: false,
            },
            profile: ProfileSummary {
                first_name: first.map(String::from),
                last_name: last.map(String::from),
                ..Default::default()
            },
            avg_rating: None,
            review_count: 0,
            featured_project: None,
        }
    }

    fn ratings(values: &[i32]) -> Vec<RatingOnly> {
        values.iter().map(|&rating| RatingOnly { rating }).collect()
    }

    #[test]
    fn average_of_no_reviews_is_none() {
        assert_eq!(average_rating(&[]), None);
    }

    #[test]
    fn average_is_arithmetic_mean() {
        assert_eq!(average_rating(&ratings(&[5, 4, 3])), Some(4.0));
        assert_eq!(average_rating(&ratings(&[5, 4])), Some(4.5));
    }

    #[test]
    fn aggregate_fills_counts_and_featured_project() {
        let id = Uuid::new_v4();
        let project = |title: &str, featured: bool| Project {
            id: Uuid::new_v4(),
            professional_id: id,
            title: title.into(),
            description: None,
            image_url: None,
            is_featured: featured,
            completion_date: None,
        };
        let row = ProfessionalRow {
            professional: Professional::onboarding(id),
            profile: None,
            ratings: ratings(&[3, 5]),
            projects: vec![project("Shed", false), project("Deck", true)],
        };

        let view = aggregate(row);
        assert_eq!(view.avg_rating, Some(4.0));
        assert_eq!(view.review_count, 2);
        assert_eq!(view.featured_project.unwrap().title, "Deck");
        assert_eq!(view.profile, ProfileSummary::default());
    }

    #[test]
    fn price_bands_have_inclusive_upper_bounds() {
        assert_eq!(price_band(None), PriceRange::Low);
        assert_eq!(price_band(Some(50.0)), PriceRange::Low);
        assert_eq!(price_band(Some(50.01)), PriceRange::Medium);
        assert_eq!(price_band(Some(100.0)), PriceRange::Medium);
        assert_eq!(price_band(Some(100.5)), PriceRange::High);
    }

    #[test]
    fn search_matches_full_name_case_insensitively() {
        let filter = ProfessionalFilter {
            search: Some("ALEX RIV".into()),
            ..Default::default()
        };
        assert!(filter.matches(&pro(Some("Alex"), Some("Rivera"), "plumbing", None)));
        assert!(!filter.matches(&pro(Some("Alexa"), Some("Stone"), "plumbing", None)));
    }

    #[test]
    fn search_treats_missing_names_as_empty() {
        let filter = ProfessionalFilter {
            search: Some("smith".into()),
            ..Default::default()
        };
        assert!(filter.matches(&pro(None, Some("Smith"), "roofing", None)));
        assert!(!filter.matches(&pro(None, None, "roofing", None)));

        let blank = ProfessionalFilter {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert!(blank.matches(&pro(None, None, "roofing", None)));
    }

    #[test]
    fn padded_term_matches_and_empty_phone_is_absent() {
        let filter = ProfessionalFilter {
            search: Some("  alex ".into()),
            ..Default::default()
        };
        assert!(filter.matches(&pro(Some("Alex"), Some("Rivera"), "plumbing", None)));

        let phone_only = ProfessionalFilter {
            phone: true,
            ..Default::default()
        };
        let mut empty = pro(Some("Alex"), Some("Rivera"), "plumbing", None);
        empty.profile.phone = Some(String::new());
        assert!(!phone_only.matches(&empty));
        empty.profile.phone = None;
        assert!(!phone_only.matches(&empty));
    }

    #[test]
    fn toggles_are_anded() {
        let mut callable = pro(Some("A"), Some("B"), "hvac", Some(120.0));
        callable.profile.phone = Some("+15125550100".into());
        callable.professional.emergency_available = true;

        let mut no_phone = callable.clone();
        no_phone.profile.phone = Some("  ".into());

        let filter = ProfessionalFilter {
            category: Some("hvac".into()),
            price: Some(PriceRange::High),
            phone: true,
            emergency: true,
            ..Default::default()
        };
        assert!(filter.matches(&callable));
        assert!(!filter.matches(&no_phone));

        let daily = ProfessionalFilter {
            daily_pay: true,
            ..filter.clone()
        };
        assert!(!daily.matches(&callable));
    }

    #[test]
    fn apply_filter_reports_shown_and_total() {
        let list = vec![
            pro(Some("Ann"), Some("Lee"), "plumbing", Some(40.0)),
            pro(Some("Bob"), Some("Ray"), "plumbing", Some(80.0)),
            pro(Some("Cy"), Some("Fox"), "painting", Some(30.0)),
        ];
        let filter = ProfessionalFilter {
            category: Some("plumbing".into()),
            price: Some(PriceRange::Low),
            ..Default::default()
        };

        let outcome = apply_filter(list, &filter);
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.shown, 1);
        assert_eq!(outcome.professionals[0].profile.first_name.as_deref(), Some("Ann"));
        assert!(filter.is_active());
        assert!(!ProfessionalFilter::default().is_active());
    }

    #[test]
    fn all_category_means_no_category_filter() {
        let filter = ProfessionalFilter {
            category: Some("all".into()),
            ..Default::default()
        };
        assert!(filter.matches(&pro(None, None, "roofing", None)));
    }
}
