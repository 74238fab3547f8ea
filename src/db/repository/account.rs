use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{parse_uuid, ts};
use crate::db::DatabaseError;

/// Credentials row of the local store. Only used when running without the
/// managed backend.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Vec<u8>,
    pub salt: Vec<u8>,
}

pub fn insert_account(
    conn: &Connection,
    account: &AccountRecord,
    created_at: &DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let result = conn.execute(
        "INSERT INTO accounts (id, email, password_hash, salt, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            account.id.to_string(),
            account.email.to_lowercase(),
            account.password_hash,
            account.salt,
            ts(created_at),
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(DatabaseError::ConstraintViolation(format!(
                "account already exists for {}",
                account.email
            )))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn find_account_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<AccountRecord>, DatabaseError> {
    let raw = conn
        .query_row(
            "SELECT id, email, password_hash, salt FROM accounts WHERE email = ?1",
            params![email.to_lowercase()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                ))
            },
        )
        .optional()?;

    match raw {
        Some((id, email, password_hash, salt)) => Ok(Some(AccountRecord {
            id: parse_uuid("accounts.id", &id)?,
            email,
            password_hash,
            salt,
        })),
        None => Ok(None),
    }
}

pub fn get_account_email(conn: &Connection, id: &Uuid) -> Result<Option<String>, DatabaseError> {
    let email = conn
        .query_row(
            "SELECT email FROM accounts WHERE id = ?1",
            params![id.to_string()],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(email)
}
