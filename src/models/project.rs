use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub is_featured: bool,
    pub completion_date: Option<NaiveDate>,
}
