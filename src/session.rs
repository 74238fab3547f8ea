//! Client-held auth session cache.
//!
//! Signing in yields a backend access token. The browser never sees it:
//! the server keeps it here and hands out an opaque bearer token instead.
//! Sessions are keyed by the SHA-256 of that bearer token, so a dump of the
//! cache does not reveal usable bearer tokens.
//!
//! Key properties:
//! - Backend tokens exist only in memory and are zeroed on drop
//! - Idle sessions expire after [`SESSION_IDLE_SECS`]
//! - A backend token close to its expiry is due for refresh
//! - Evicted sessions queue their backend token for revocation
//! - The signed-in profile is cached beside the token and refreshed on writes

use std::collections::HashMap;
use std::time::{Duration, Instant};

use uuid::Uuid;
use zeroize::Zeroize;

use crate::backend::AuthSession;
use crate::models::Profile;

/// Idle timeout for a cached session (8 hours).
pub const SESSION_IDLE_SECS: u64 = 8 * 3600;

/// A backend token this close to expiry is refreshed before use.
pub const REFRESH_MARGIN_SECS: u64 = 60;

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

// ═══════════════════════════════════════════════════════════
// AccessToken: zeroed on drop
// ═══════════════════════════════════════════════════════════

/// Backend access token. Zeroed on drop, redacted in debug output.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

// ═══════════════════════════════════════════════════════════
// CachedSession: one signed-in user
// ═══════════════════════════════════════════════════════════

pub struct CachedSession {
    user_id: Uuid,
    email: Option<String>,
    access_token: AccessToken,
    refresh_token: Option<AccessToken>,
    /// When the backend stops accepting `access_token`. `None` never expires.
    expires_at: Option<Instant>,
    profile: Option<Profile>,
    last_seen: Instant,
}

impl CachedSession {
    pub fn new(user_id: Uuid, email: Option<String>, access_token: String) -> Self {
        Self {
            user_id,
            email,
            access_token: AccessToken::new(access_token),
            refresh_token: None,
            expires_at: None,
            profile: None,
            last_seen: Instant::now(),
        }
    }

    pub fn from_auth(session: &AuthSession) -> Self {
        Self::new(
            session.user.id,
            session.user.email.clone(),
            session.access_token.clone(),
        )
        .with_expiry(session.expires_in, session.refresh_token.clone())
    }

    pub fn with_expiry(mut self, expires_in: Option<u64>, refresh_token: Option<String>) -> Self {
        self.expires_at = expires_in.map(|secs| Instant::now() + Duration::from_secs(secs));
        self.refresh_token = refresh_token.map(AccessToken::new);
        self
    }

    pub fn with_profile(mut self, profile: Option<Profile>) -> Self {
        self.profile = profile;
        self
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&AccessToken> {
        self.refresh_token.as_ref()
    }

    /// Whether the backend token expires within [`REFRESH_MARGIN_SECS`].
    pub fn needs_refresh(&self) -> bool {
        self.expires_at
            .is_some_and(|at| Instant::now() + Duration::from_secs(REFRESH_MARGIN_SECS) >= at)
    }

    /// Swap in the tokens of a refreshed backend session. The old refresh
    /// token is kept when the backend did not rotate it.
    fn renew(&mut self, session: &AuthSession) {
        self.access_token = AccessToken::new(session.access_token.clone());
        if let Some(ref refresh) = session.refresh_token {
            self.refresh_token = Some(AccessToken::new(refresh.clone()));
        }
        self.expires_at = session
            .expires_in
            .map(|secs| Instant::now() + Duration::from_secs(secs));
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn is_professional(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.is_professional)
    }
}

// ═══════════════════════════════════════════════════════════
// SessionStore: all signed-in users
// ═══════════════════════════════════════════════════════════

pub struct SessionStore {
    sessions: HashMap<[u8; 32], CachedSession>,
    idle_timeout: Duration,
    /// Backend tokens of evicted sessions, not yet revoked.
    evicted: Vec<AccessToken>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_idle_timeout(Duration::from_secs(SESSION_IDLE_SECS))
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            idle_timeout,
            evicted: Vec::new(),
        }
    }

    /// Cache a session and return the bearer token that addresses it.
    pub fn insert(&mut self, session: CachedSession) -> String {
        self.purge_expired();
        let token = generate_token();
        self.sessions.insert(hash_token(&token), session);
        token
    }

    /// Look up a live session and mark it as used. Expired sessions are
    /// evicted on access.
    pub fn touch(&mut self, token: &str) -> Option<&CachedSession> {
        let key = hash_token(token);
        let expired = self
            .sessions
            .get(&key)
            .map(|s| s.last_seen.elapsed() >= self.idle_timeout)?;

        if expired {
            self.evict_key(&key);
            return None;
        }

        let session = self.sessions.get_mut(&key)?;
        session.last_seen = Instant::now();
        Some(&*session)
    }

    /// User behind a live session, without marking it as used.
    pub fn live_user(&self, token: &str) -> Option<Uuid> {
        self.sessions
            .get(&hash_token(token))
            .filter(|s| s.last_seen.elapsed() < self.idle_timeout)
            .map(|s| s.user_id)
    }

    /// Replace the cached profile of every session belonging to `user_id`.
    pub fn set_profile(&mut self, user_id: &Uuid, profile: Profile) {
        for session in self.sessions.values_mut() {
            if &session.user_id == user_id {
                session.profile = Some(profile.clone());
            }
        }
    }

    /// Replace the backend tokens of a live session after a refresh.
    pub fn renew(&mut self, token: &str, session: &AuthSession) -> Option<&CachedSession> {
        let cached = self.sessions.get_mut(&hash_token(token))?;
        cached.renew(session);
        Some(&*cached)
    }

    /// Drop one session. The backend token is zeroed via drop.
    pub fn remove(&mut self, token: &str) -> Option<CachedSession> {
        self.sessions.remove(&hash_token(token))
    }

    /// Drop a session the backend no longer honours and queue its token
    /// for revocation.
    pub fn evict(&mut self, token: &str) {
        self.evict_key(&hash_token(token));
    }

    fn evict_key(&mut self, key: &[u8; 32]) {
        if let Some(session) = self.sessions.remove(key) {
            self.evicted.push(session.access_token.clone());
        }
    }

    pub fn purge_expired(&mut self) {
        let timeout = self.idle_timeout;
        let expired: Vec<[u8; 32]> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.last_seen.elapsed() >= timeout)
            .map(|(key, _)| *key)
            .collect();
        for key in expired {
            self.evict_key(&key);
        }
    }

    /// Backend tokens of evicted sessions, handed over for revocation.
    pub fn take_evicted(&mut self) -> Vec<AccessToken> {
        std::mem::take(&mut self.evicted)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
