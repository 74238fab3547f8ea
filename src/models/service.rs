use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    /// Minutes.
    pub duration: i32,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for `services`; id and created_at are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewService {
    pub professional_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub duration: i32,
}
