use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_ts, parse_uuid, ts};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_emergency(conn: &Connection, sos: &EmergencySos) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO emergency_sos (id, client_id, professional_id, location, description, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            sos.id.to_string(),
            sos.client_id.to_string(),
            sos.professional_id.map(|id| id.to_string()),
            sos.location,
            sos.description,
            sos.status.as_str(),
            ts(&sos.created_at),
        ],
    )?;
    Ok(())
}

/// Emergency requests raised by one client, newest first.
pub fn list_client_emergencies(
    conn: &Connection,
    client_id: &Uuid,
) -> Result<Vec<EmergencySos>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, client_id, professional_id, location, description, status, created_at
         FROM emergency_sos WHERE client_id = ?1 ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map(params![client_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut result = Vec::new();
    for row in rows {
        let (id, client_id, professional_id, location, description, status, created_at) = row?;
        result.push(EmergencySos {
            id: parse_uuid("emergency_sos.id", &id)?,
            client_id: parse_uuid("emergency_sos.client_id", &client_id)?,
            professional_id: professional_id
                .map(|p| parse_uuid("emergency_sos.professional_id", &p))
                .transpose()?,
            location,
            description,
            status: EmergencyStatus::from_str(&status)?,
            created_at: parse_ts("emergency_sos.created_at", &created_at)?,
        });
    }
    Ok(result)
}
