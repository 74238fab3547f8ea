use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{ts, ts_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const BOOKING_SELECT: &str = "SELECT b.id, b.professional_id, b.client_id, b.service_id,
        b.booking_date, b.status, b.created_at,
        c.first_name, c.last_name, c.location, c.phone, c.id IS NOT NULL
     FROM bookings b
     LEFT JOIN profiles c ON c.id = b.client_id";

/// Raw row: the status column is parsed outside the rusqlite closure so an
/// unknown value surfaces as `DatabaseError::InvalidEnum`.
fn booking_from_row(row: &Row<'_>) -> rusqlite::Result<(Booking, String)> {
    let has_client: bool = row.get::<_, i32>(11)? != 0;
    let client = if has_client {
        Some(ClientSummary {
            first_name: row.get(7)?,
            last_name: row.get(8)?,
            location: row.get(9)?,
            phone: row.get(10)?,
        })
    } else {
        None
    };

    Ok((
        Booking {
            id: uuid_col(row, 0)?,
            professional_id: uuid_col(row, 1)?,
            client_id: uuid_col(row, 2)?,
            service_id: uuid_col(row, 3)?,
            booking_date: ts_col(row, 4)?,
            status: BookingStatus::Pending,
            created_at: ts_col(row, 6)?,
            client,
        },
        row.get::<_, String>(5)?,
    ))
}

fn with_status((mut booking, status): (Booking, String)) -> Result<Booking, DatabaseError> {
    booking.status = BookingStatus::from_str(&status)?;
    Ok(booking)
}

pub fn insert_booking(conn: &Connection, booking: &Booking) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO bookings (id, professional_id, client_id, service_id, booking_date, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            booking.id.to_string(),
            booking.professional_id.to_string(),
            booking.client_id.to_string(),
            booking.service_id.to_string(),
            ts(&booking.booking_date),
            booking.status.as_str(),
            ts(&booking.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &Uuid) -> Result<Option<Booking>, DatabaseError> {
    let sql = format!("{BOOKING_SELECT} WHERE b.id = ?1");
    let raw = conn
        .query_row(&sql, params![id.to_string()], booking_from_row)
        .optional()?;
    raw.map(with_status).transpose()
}

/// Bookings on one side of the marketplace, latest booking date first.
pub fn list_bookings(conn: &Connection, scope: BookingScope) -> Result<Vec<Booking>, DatabaseError> {
    let (column, id) = match scope {
        BookingScope::Professional(id) => ("b.professional_id", id),
        BookingScope::Client(id) => ("b.client_id", id),
    };
    let sql = format!("{BOOKING_SELECT} WHERE {column} = ?1 ORDER BY b.booking_date DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![id.to_string()], booking_from_row)?;

    let mut bookings = Vec::new();
    for row in rows {
        bookings.push(with_status(row?)?);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &Uuid,
    status: BookingStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE bookings SET status = ?2 WHERE id = ?1",
        params![id.to_string(), status.as_str()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Booking".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
