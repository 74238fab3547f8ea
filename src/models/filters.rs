use serde::Deserialize;
use uuid::Uuid;

use super::enums::PriceRange;

/// Backend-side listing query: optional category equality, ordered by
/// years of experience (most first), paged by limit/offset.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfessionalQuery {
    pub category: Option<String>,
    pub id: Option<Uuid>,
    pub limit: u32,
    pub offset: u32,
}

impl ProfessionalQuery {
    pub fn top(limit: u32) -> Self {
        Self {
            category: None,
            id: None,
            limit,
            offset: 0,
        }
    }

    pub fn by_category(category: &str, limit: u32, offset: u32) -> Self {
        Self {
            category: Some(category.to_string()),
            id: None,
            limit,
            offset,
        }
    }

    pub fn by_id(id: Uuid) -> Self {
        Self {
            category: None,
            id: Some(id),
            limit: 1,
            offset: 0,
        }
    }
}

/// Which side of a booking a listing is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingScope {
    Professional(Uuid),
    Client(Uuid),
}

/// In-memory listing filter applied to an already-fetched page.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProfessionalFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<PriceRange>,
    #[serde(default)]
    pub phone: bool,
    #[serde(default)]
    pub emergency: bool,
    #[serde(default)]
    pub daily_pay: bool,
}
