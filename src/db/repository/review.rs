use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{ts, ts_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: uuid_col(row, 0)?,
        professional_id: uuid_col(row, 1)?,
        client_id: uuid_col(row, 2)?,
        rating: row.get(3)?,
        comment: row.get(4)?,
        created_at: ts_col(row, 5)?,
    })
}

pub fn insert_review(conn: &Connection, review: &Review) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO reviews (id, professional_id, client_id, rating, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            review.id.to_string(),
            review.professional_id.to_string(),
            review.client_id.to_string(),
            review.rating,
            review.comment,
            ts(&review.created_at),
        ],
    )?;
    Ok(())
}

/// Reviews of one professional, newest first.
pub fn list_reviews(conn: &Connection, professional_id: &Uuid) -> Result<Vec<Review>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, professional_id, client_id, rating, comment, created_at
         FROM reviews WHERE professional_id = ?1 ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map(params![professional_id.to_string()], review_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn list_ratings(conn: &Connection, professional_id: &Uuid) -> Result<Vec<RatingOnly>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT rating FROM reviews WHERE professional_id = ?1")?;
    let rows = stmt.query_map(params![professional_id.to_string()], |row| {
        Ok(RatingOnly { rating: row.get(0)? })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
