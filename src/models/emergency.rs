use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::EmergencyStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencySos {
    pub id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Option<Uuid>,
    pub location: String,
    pub description: String,
    pub status: EmergencyStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmergencySos {
    pub client_id: Uuid,
    pub professional_id: Option<Uuid>,
    pub location: String,
    pub description: String,
    pub status: EmergencyStatus,
}
