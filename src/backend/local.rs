use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use pbkdf2::pbkdf2_hmac;
use rusqlite::Connection;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::{AuthSession, AuthUser, BackendError, MarketBackend, SignUpRequest, SignUpOutcome};
use crate::db::{self, AccountRecord, DatabaseError};
use crate::models::*;
use crate::session::{generate_token, hash_token};

/// Work factor for local account passwords. Local accounts only guard a
/// developer database, so this is well below a production setting.
pub const PBKDF2_ITERATIONS: u32 = 10_000;
pub const SALT_LENGTH: usize = 16;
const HASH_LENGTH: usize = 32;

/// Derive the stored password hash using PBKDF2-SHA256.
pub fn hash_password(password: &str, salt: &[u8]) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut out);
    out
}

/// Constant-time comparison against a stored hash.
pub fn verify_password(password: &str, salt: &[u8], expected: &[u8]) -> bool {
    let derived = hash_password(password, salt);
    derived[..].ct_eq(expected).into()
}

fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Create an account with its profile row (and an onboarding professional
/// row when the user registers as a provider). Runs in one transaction.
pub fn register_account(conn: &Connection, request: &SignUpRequest) -> Result<Uuid, DatabaseError> {
    let now = Utc::now();
    let id = Uuid::new_v4();
    let salt = generate_salt();

    let tx = conn.unchecked_transaction()?;
    db::insert_account(
        &tx,
        &AccountRecord {
            id,
            email: request.email.trim().to_string(),
            password_hash: hash_password(&request.password, &salt).to_vec(),
            salt: salt.to_vec(),
        },
        &now,
    )?;
    db::insert_profile(
        &tx,
        &Profile {
            id,
            first_name: Some(request.first_name.clone()),
            last_name: Some(request.last_name.clone()),
            avatar_url: None,
            phone: request.phone.clone().filter(|p| !p.trim().is_empty()),
            bio: None,
            location: None,
            is_professional: request.is_professional,
            created_at: now,
            updated_at: now,
        },
    )?;
    if request.is_professional {
        db::insert_professional(&tx, &Professional::onboarding(id))?;
    }
    tx.commit()?;
    Ok(id)
}

/// SQLite-backed store with local password accounts.
pub struct LocalStore {
    conn: Mutex<Connection>,
    /// Issued access tokens (hashed) → account id.
    tokens: Mutex<HashMap<[u8; 32], Uuid>>,
    /// Issued refresh tokens (hashed) → (hashed access token, account id).
    refresh_tokens: Mutex<HashMap<[u8; 32], ([u8; 32], Uuid)>>,
}

impl LocalStore {
    /// Open (and migrate) the store at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, BackendError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BackendError::Connection(format!("{}: {e}", parent.display()))
            })?;
        }
        Ok(Self::from_connection(db::open_database(path)?))
    }

    pub fn in_memory() -> Result<Self, BackendError> {
        Ok(Self::from_connection(db::open_memory_database()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            tokens: Mutex::new(HashMap::new()),
            refresh_tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` against the locked connection.
    pub fn with_conn<T, F>(&self, f: F) -> Result<T, BackendError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| BackendError::LockPoisoned)?;
        f(&conn).map_err(BackendError::from)
    }

    /// Issue an access token and the refresh token that can replace it.
    /// Local access tokens do not expire, so no lifetime is reported.
    fn issue_session(&self, user: AuthUser) -> Result<AuthSession, BackendError> {
        let access_token = generate_token();
        let refresh_token = generate_token();
        let access_hash = hash_token(&access_token);

        self.tokens
            .lock()
            .map_err(|_| BackendError::LockPoisoned)?
            .insert(access_hash, user.id);
        self.refresh_tokens
            .lock()
            .map_err(|_| BackendError::LockPoisoned)?
            .insert(hash_token(&refresh_token), (access_hash, user.id));

        Ok(AuthSession {
            access_token,
            refresh_token: Some(refresh_token),
            expires_in: None,
            user,
        })
    }

    /// Revoke an access token and any refresh token issued with it.
    fn revoke(&self, access_hash: &[u8; 32]) -> Result<(), BackendError> {
        self.tokens
            .lock()
            .map_err(|_| BackendError::LockPoisoned)?
            .remove(access_hash);
        self.refresh_tokens
            .lock()
            .map_err(|_| BackendError::LockPoisoned)?
            .retain(|_, (paired, _)| paired != access_hash);
        Ok(())
    }

    /// Number of live access tokens.
    pub fn issued_tokens(&self) -> Result<usize, BackendError> {
        Ok(self
            .tokens
            .lock()
            .map_err(|_| BackendError::LockPoisoned)?
            .len())
    }

    fn authorize(&self, auth: &str) -> Result<Uuid, BackendError> {
        self.tokens
            .lock()
            .map_err(|_| BackendError::LockPoisoned)?
            .get(&hash_token(auth))
            .copied()
            .ok_or(BackendError::Unauthorized)
    }
}

fn missing(entity: &'static str, id: &Uuid) -> BackendError {
    BackendError::NotFound {
        entity,
        id: id.to_string(),
    }
}

impl MarketBackend for LocalStore {
    fn kind(&self) -> &'static str {
        "local"
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let account = self
            .with_conn(|conn| db::find_account_by_email(conn, email.trim()))?
            .ok_or(BackendError::InvalidCredentials)?;

        if !verify_password(password, &account.salt, &account.password_hash) {
            tracing::debug!(account = %account.id, "Local sign-in rejected");
            return Err(BackendError::InvalidCredentials);
        }

        self.issue_session(AuthUser {
            id: account.id,
            email: Some(account.email),
        })
    }

    fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, BackendError> {
        let id = self
            .with_conn(|conn| register_account(conn, request))
            .map_err(|e| match e {
                BackendError::Database(DatabaseError::ConstraintViolation(_)) => {
                    BackendError::AccountExists(request.email.clone())
                }
                other => other,
            })?;

        let user = AuthUser {
            id,
            email: Some(request.email.trim().to_lowercase()),
        };
        let session = self.issue_session(user.clone())?;
        Ok(SignUpOutcome {
            user,
            session: Some(session),
        })
    }

    fn sign_out(&self, auth: &str) -> Result<(), BackendError> {
        self.revoke(&hash_token(auth))
    }

    /// Refresh tokens are single use. The pair they were issued with is
    /// revoked and a new pair takes its place.
    fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        let (access_hash, user_id) = self
            .refresh_tokens
            .lock()
            .map_err(|_| BackendError::LockPoisoned)?
            .remove(&hash_token(refresh_token))
            .ok_or(BackendError::Unauthorized)?;
        self.revoke(&access_hash)?;

        let email = self.with_conn(|conn| db::get_account_email(conn, &user_id))?;
        self.issue_session(AuthUser { id: user_id, email })
    }

    fn list_professionals(
        &self,
        query: &ProfessionalQuery,
    ) -> Result<Vec<ProfessionalRow>, BackendError> {
        self.with_conn(|conn| db::list_professional_rows(conn, query))
    }

    fn count_professionals(&self) -> Result<u64, BackendError> {
        self.with_conn(db::count_professionals)
    }

    fn get_professional(&self, id: &Uuid) -> Result<Option<Professional>, BackendError> {
        self.with_conn(|conn| db::get_professional(conn, id))
    }

    fn list_services(&self, professional_id: &Uuid) -> Result<Vec<Service>, BackendError> {
        self.with_conn(|conn| db::list_services(conn, professional_id))
    }

    fn get_service(&self, id: &Uuid) -> Result<Option<Service>, BackendError> {
        self.with_conn(|conn| db::get_service(conn, id))
    }

    fn list_reviews(&self, professional_id: &Uuid) -> Result<Vec<Review>, BackendError> {
        self.with_conn(|conn| db::list_reviews(conn, professional_id))
    }

    fn get_profile(&self, auth: &str, id: &Uuid) -> Result<Option<Profile>, BackendError> {
        self.authorize(auth)?;
        self.with_conn(|conn| db::get_profile(conn, id))
    }

    fn update_profile(
        &self,
        auth: &str,
        id: &Uuid,
        update: &ProfileUpdate,
    ) -> Result<Profile, BackendError> {
        self.authorize(auth)?;
        self.with_conn(|conn| {
            db::update_profile(conn, id, update)?;
            db::get_profile(conn, id)
        })?
        .ok_or_else(|| missing("Profile", id))
    }

    fn upsert_professional(
        &self,
        auth: &str,
        professional: &Professional,
    ) -> Result<Professional, BackendError> {
        self.authorize(auth)?;
        self.with_conn(|conn| {
            db::upsert_professional(conn, professional)?;
            db::get_professional(conn, &professional.id)
        })?
        .ok_or_else(|| missing("Professional", &professional.id))
    }

    fn insert_service(&self, auth: &str, new: &NewService) -> Result<Service, BackendError> {
        self.authorize(auth)?;
        let service = Service {
            id: Uuid::new_v4(),
            professional_id: new.professional_id,
            title: new.title.clone(),
            description: new.description.clone(),
            price: new.price,
            duration: new.duration,
            created_at: Utc::now(),
        };
        self.with_conn(|conn| db::insert_service(conn, &service))?;
        Ok(service)
    }

    fn list_bookings(&self, auth: &str, scope: BookingScope) -> Result<Vec<Booking>, BackendError> {
        self.authorize(auth)?;
        self.with_conn(|conn| db::list_bookings(conn, scope))
    }

    fn get_booking(&self, auth: &str, id: &Uuid) -> Result<Option<Booking>, BackendError> {
        self.authorize(auth)?;
        self.with_conn(|conn| db::get_booking(conn, id))
    }

    fn insert_booking(&self, auth: &str, new: &NewBooking) -> Result<Booking, BackendError> {
        self.authorize(auth)?;
        let booking = Booking {
            id: Uuid::new_v4(),
            professional_id: new.professional_id,
            client_id: new.client_id,
            service_id: new.service_id,
            booking_date: new.booking_date,
            status: new.status,
            created_at: Utc::now(),
            client: None,
        };
        self.with_conn(|conn| db::insert_booking(conn, &booking))?;
        Ok(booking)
    }

    fn update_booking_status(
        &self,
        auth: &str,
        id: &Uuid,
        status: BookingStatus,
    ) -> Result<Booking, BackendError> {
        self.authorize(auth)?;
        self.with_conn(|conn| {
            db::update_booking_status(conn, id, status)?;
            db::get_booking(conn, id)
        })?
        .ok_or_else(|| missing("Booking", id))
    }

    fn insert_emergency(
        &self,
        auth: &str,
        new: &NewEmergencySos,
    ) -> Result<EmergencySos, BackendError> {
        self.authorize(auth)?;
        let sos = EmergencySos {
            id: Uuid::new_v4(),
            client_id: new.client_id,
            professional_id: new.professional_id,
            location: new.location.clone(),
            description: new.description.clone(),
            status: new.status,
            created_at: Utc::now(),
        };
        self.with_conn(|conn| db::insert_emergency(conn, &sos))?;
        Ok(sos)
    }

    fn list_emergencies(
        &self,
        auth: &str,
        client_id: &Uuid,
    ) -> Result<Vec<EmergencySos>, BackendError> {
        self.authorize(auth)?;
        self.with_conn(|conn| db::list_client_emergencies(conn, client_id))
    }
}
