use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{ts, ts_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

const PROFILE_COLUMNS: &str = "id, first_name, last_name, avatar_url, phone, bio, location,
     is_professional, created_at, updated_at";

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: uuid_col(row, 0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        avatar_url: row.get(3)?,
        phone: row.get(4)?,
        bio: row.get(5)?,
        location: row.get(6)?,
        is_professional: row.get::<_, i32>(7)? != 0,
        created_at: ts_col(row, 8)?,
        updated_at: ts_col(row, 9)?,
    })
}

pub fn insert_profile(conn: &Connection, profile: &Profile) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO profiles (id, first_name, last_name, avatar_url, phone, bio, location,
         is_professional, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            profile.id.to_string(),
            profile.first_name,
            profile.last_name,
            profile.avatar_url,
            profile.phone,
            profile.bio,
            profile.location,
            profile.is_professional as i32,
            ts(&profile.created_at),
            ts(&profile.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_profile(conn: &Connection, id: &Uuid) -> Result<Option<Profile>, DatabaseError> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1");
    let profile = conn
        .query_row(&sql, params![id.to_string()], profile_from_row)
        .optional()?;
    Ok(profile)
}

/// Apply the non-empty fields of `update`; untouched columns keep their value.
pub fn update_profile(
    conn: &Connection,
    id: &Uuid,
    update: &ProfileUpdate,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE profiles SET
            first_name = COALESCE(?2, first_name),
            last_name = COALESCE(?3, last_name),
            phone = COALESCE(?4, phone),
            bio = COALESCE(?5, bio),
            location = COALESCE(?6, location),
            is_professional = COALESCE(?7, is_professional),
            updated_at = ?8
         WHERE id = ?1",
        params![
            id.to_string(),
            update.first_name,
            update.last_name,
            update.phone,
            update.bio,
            update.location,
            update.is_professional.map(|b| b as i32),
            ts(&update.updated_at),
        ],
    )?;

    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Profile".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
