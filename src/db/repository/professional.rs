use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{json_col, uuid_col};
use crate::db::DatabaseError;
use crate::models::*;

use super::project::list_projects;
use super::review::list_ratings;

const PROFESSIONAL_COLUMNS: &str = "p.id, p.category, p.hourly_rate, p.years_experience,
     p.availability, p.verification_badge, p.specialties, p.emergency_available,
     p.daily_pay_available";

fn professional_from_row(row: &Row<'_>) -> rusqlite::Result<Professional> {
    Ok(Professional {
        id: uuid_col(row, 0)?,
        category: row.get(1)?,
        hourly_rate: row.get(2)?,
        years_experience: row.get(3)?,
        availability: row.get(4)?,
        verification_badge: row.get::<_, i32>(5)? != 0,
        specialties: json_col(row, 6)?,
        emergency_available: row.get::<_, i32>(7)? != 0,
        daily_pay_available: row.get::<_, i32>(8)? != 0,
    })
}

fn specialties_json(prof: &Professional) -> Result<String, DatabaseError> {
    serde_json::to_string(&prof.specialties).map_err(|e| DatabaseError::InvalidValue {
        column: "professionals.specialties".into(),
        value: e.to_string(),
    })
}

pub fn insert_professional(conn: &Connection, prof: &Professional) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO professionals (id, category, hourly_rate, years_experience, availability,
         verification_badge, specialties, emergency_available, daily_pay_available)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            prof.id.to_string(),
            prof.category,
            prof.hourly_rate,
            prof.years_experience,
            prof.availability,
            prof.verification_badge as i32,
            specialties_json(prof)?,
            prof.emergency_available as i32,
            prof.daily_pay_available as i32,
        ],
    )?;
    Ok(())
}

/// Overwrite the editable columns. The verification badge is owned by the
/// platform and left untouched.
pub fn update_professional(conn: &Connection, prof: &Professional) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE professionals SET category = ?2, hourly_rate = ?3, years_experience = ?4,
         availability = ?5, specialties = ?6, emergency_available = ?7, daily_pay_available = ?8
         WHERE id = ?1",
        params![
            prof.id.to_string(),
            prof.category,
            prof.hourly_rate,
            prof.years_experience,
            prof.availability,
            specialties_json(prof)?,
            prof.emergency_available as i32,
            prof.daily_pay_available as i32,
        ],
    )?;

    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Professional".into(),
            id: prof.id.to_string(),
        });
    }
    Ok(())
}

pub fn get_professional(conn: &Connection, id: &Uuid) -> Result<Option<Professional>, DatabaseError> {
    let sql = format!("SELECT {PROFESSIONAL_COLUMNS} FROM professionals p WHERE p.id = ?1");
    let prof = conn
        .query_row(&sql, params![id.to_string()], professional_from_row)
        .optional()?;
    Ok(prof)
}

/// Insert the row, or update it when the provider already has one.
pub fn upsert_professional(conn: &Connection, prof: &Professional) -> Result<(), DatabaseError> {
    if get_professional(conn, &prof.id)?.is_some() {
        update_professional(conn, prof)
    } else {
        insert_professional(conn, prof)
    }
}

/// Listing rows with profile, ratings and projects embedded. Ordered by
/// years of experience, most first. Unknown experience sorts ahead of it,
/// matching PostgreSQL's default for a descending sort.
pub fn list_professional_rows(
    conn: &Connection,
    query: &ProfessionalQuery,
) -> Result<Vec<ProfessionalRow>, DatabaseError> {
    let mut sql = format!(
        "SELECT {PROFESSIONAL_COLUMNS},
                pr.first_name, pr.last_name, pr.avatar_url, pr.location, pr.bio, pr.phone,
                pr.id IS NOT NULL
         FROM professionals p
         LEFT JOIN profiles pr ON pr.id = p.id
         WHERE 1 = 1"
    );
    let mut values: Vec<Value> = Vec::new();

    if let Some(ref category) = query.category {
        values.push(Value::Text(category.clone()));
        sql.push_str(&format!(" AND p.category = ?{}", values.len()));
    }
    if let Some(id) = query.id {
        values.push(Value::Text(id.to_string()));
        sql.push_str(&format!(" AND p.id = ?{}", values.len()));
    }

    values.push(Value::Integer(i64::from(query.limit)));
    let limit_idx = values.len();
    values.push(Value::Integer(i64::from(query.offset)));
    let offset_idx = values.len();
    sql.push_str(&format!(
        " ORDER BY p.years_experience IS NULL DESC, p.years_experience DESC, p.id
          LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
    ));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
        let professional = professional_from_row(row)?;
        let has_profile: bool = row.get::<_, i32>(15)? != 0;
        let profile = if has_profile {
            Some(ProfileSummary {
                first_name: row.get(9)?,
                last_name: row.get(10)?,
                avatar_url: row.get(11)?,
                location: row.get(12)?,
                bio: row.get(13)?,
                phone: row.get(14)?,
            })
        } else {
            None
        };
        Ok((professional, profile))
    })?;

    let mut result = Vec::new();
    for row in rows {
        let (professional, profile) = row?;
        let ratings = list_ratings(conn, &professional.id)?;
        let projects = list_projects(conn, &professional.id)?;
        result.push(ProfessionalRow {
            professional,
            profile,
            ratings,
            projects,
        });
    }
    Ok(result)
}

pub fn count_professionals(conn: &Connection) -> Result<u64, DatabaseError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM professionals", [], |row| row.get(0))?;
    Ok(count as u64)
}
