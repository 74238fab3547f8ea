use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{ts, ts_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

fn service_from_row(row: &Row<'_>) -> rusqlite::Result<Service> {
    Ok(Service {
        id: uuid_col(row, 0)?,
        professional_id: uuid_col(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        duration: row.get(5)?,
        created_at: ts_col(row, 6)?,
    })
}

pub fn insert_service(conn: &Connection, service: &Service) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO services (id, professional_id, title, description, price, duration, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            service.id.to_string(),
            service.professional_id.to_string(),
            service.title,
            service.description,
            service.price,
            service.duration,
            ts(&service.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_service(conn: &Connection, id: &Uuid) -> Result<Option<Service>, DatabaseError> {
    let service = conn
        .query_row(
            "SELECT id, professional_id, title, description, price, duration, created_at
             FROM services WHERE id = ?1",
            params![id.to_string()],
            service_from_row,
        )
        .optional()?;
    Ok(service)
}

/// Services of one professional, newest first.
pub fn list_services(conn: &Connection, professional_id: &Uuid) -> Result<Vec<Service>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, professional_id, title, description, price, duration, created_at
         FROM services WHERE professional_id = ?1 ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map(params![professional_id.to_string()], service_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
