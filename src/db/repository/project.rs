use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::uuid_col;
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_project(conn: &Connection, project: &Project) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO projects (id, professional_id, title, description, image_url, is_featured, completion_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            project.id.to_string(),
            project.professional_id.to_string(),
            project.title,
            project.description,
            project.image_url,
            project.is_featured as i32,
            project.completion_date.map(|d| d.to_string()),
        ],
    )?;
    Ok(())
}

/// Projects of one professional, featured ones first.
pub fn list_projects(conn: &Connection, professional_id: &Uuid) -> Result<Vec<Project>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, professional_id, title, description, image_url, is_featured, completion_date
         FROM projects WHERE professional_id = ?1 ORDER BY is_featured DESC, title",
    )?;

    let rows = stmt.query_map(params![professional_id.to_string()], |row| {
        Ok(Project {
            id: uuid_col(row, 0)?,
            professional_id: uuid_col(row, 1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            image_url: row.get(4)?,
            is_featured: row.get::<_, i32>(5)? != 0,
            completion_date: row
                .get::<_, Option<String>>(6)?
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
