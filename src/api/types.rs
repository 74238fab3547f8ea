//! Shared state and request context for the HTTP API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::api::error::ApiError;
use crate::backend::MarketBackend;
use crate::marketplace::Actor;
use crate::session::{AccessToken, CachedSession, SessionStore};

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub backend: Arc<dyn MarketBackend>,
    pub sessions: Arc<RwLock<SessionStore>>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
    pub started_at: Instant,
}

impl ApiContext {
    pub fn new(backend: Arc<dyn MarketBackend>, rate_limiter: RateLimiter) -> Self {
        Self {
            backend,
            sessions: Arc::new(RwLock::new(SessionStore::new())),
            rate_limiter: Arc::new(Mutex::new(rate_limiter)),
            started_at: Instant::now(),
        }
    }

    /// Run a backend call on the blocking pool. The backend is synchronous
    /// (blocking HTTP client or a locked SQLite connection).
    pub async fn blocking<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&dyn MarketBackend) -> T + Send + 'static,
        T: Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || f(backend.as_ref()))
            .await
            .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))
    }

    /// Sign out the backend tokens of sessions the cache has evicted.
    /// Failures are logged: the token is unusable from here on either way.
    pub async fn revoke_evicted(&self) {
        // Guard dropped before the blocking call is awaited.
        let tokens = {
            let Ok(mut sessions) = self.sessions.write() else {
                return;
            };
            sessions.take_evicted()
        };
        if tokens.is_empty() {
            return;
        }

        let count = tokens.len();
        let result = self
            .blocking(move |backend| {
                for token in &tokens {
                    if let Err(e) = backend.sign_out(token.expose()) {
                        tracing::debug!(error = %e, "Revoking evicted session failed");
                    }
                }
            })
            .await;
        if result.is_ok() {
            tracing::debug!(count, "Revoked evicted sessions");
        }
    }

    pub fn sessions_read(&self) -> Result<std::sync::RwLockReadGuard<'_, SessionStore>, ApiError> {
        self.sessions
            .read()
            .map_err(|_| ApiError::Internal("session lock".into()))
    }

    pub fn sessions_write(&self) -> Result<std::sync::RwLockWriteGuard<'_, SessionStore>, ApiError> {
        self.sessions
            .write()
            .map_err(|_| ApiError::Internal("session lock".into()))
    }
}

// ═══════════════════════════════════════════════════════════
// User context: injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Signed-in user, injected into request extensions by the auth
/// middleware after the bearer token resolved to a live session.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub is_professional: bool,
    pub access_token: AccessToken,
    /// The opaque bearer token the browser presented.
    pub bearer: AccessToken,
}

impl UserContext {
    pub fn from_session(session: &CachedSession, bearer: &str) -> Self {
        Self {
            user_id: session.user_id(),
            email: session.email().map(String::from),
            is_professional: session.is_professional(),
            access_token: session.access_token().clone(),
            bearer: AccessToken::new(bearer.to_string()),
        }
    }

    pub fn actor(&self) -> Actor<'_> {
        Actor::new(self.user_id, self.access_token.expose())
    }
}

// ═══════════════════════════════════════════════════════════
// Rate limiter: per-client sliding window
// ═══════════════════════════════════════════════════════════

/// Per-client rate limiter with per-minute and per-hour limits.
pub struct RateLimiter {
    windows: HashMap<String, Vec<Instant>>,
    per_minute: u32,
    per_hour: u32,
}

impl RateLimiter {
    pub fn new(per_minute: u32, per_hour: u32) -> Self {
        Self {
            windows: HashMap::new(),
            per_minute,
            per_hour,
        }
    }

    /// Check if a client is within rate limits. Returns `Ok(())` or
    /// `Err(retry_after_secs)` if exceeded.
    pub fn check(&mut self, key: &str) -> Result<(), u64> {
        let now = Instant::now();
        if self.windows.len() > 10_000 {
            self.windows.retain(|_, entries| {
                entries
                    .last()
                    .is_some_and(|ts| now.duration_since(*ts) < Duration::from_secs(3600))
            });
        }
        let entries = self.windows.entry(key.to_string()).or_default();

        entries.retain(|ts| now.duration_since(*ts) < Duration::from_secs(3600));

        let last_minute = entries
            .iter()
            .filter(|ts| now.duration_since(**ts) < Duration::from_secs(60))
            .count() as u32;
        if last_minute >= self.per_minute {
            return Err(60);
        }

        if entries.len() as u32 >= self.per_hour {
            return Err(3600);
        }

        entries.push(now);
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(120, 2000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalStore;

    #[test]
    fn rate_limiter_allows_under_limit() {
        let mut limiter = RateLimiter::default();
        assert!(limiter.check("ip:10.0.0.1").is_ok());
        assert!(limiter.check("ip:10.0.0.1").is_ok());
    }

    #[test]
    fn rate_limiter_rejects_over_per_minute() {
        let mut limiter = RateLimiter::new(2, 1000);
        assert!(limiter.check("ip:10.0.0.1").is_ok());
        assert!(limiter.check("ip:10.0.0.1").is_ok());
        assert_eq!(limiter.check("ip:10.0.0.1"), Err(60));
    }

    #[test]
    fn rate_limiter_rejects_over_per_hour() {
        let mut limiter = RateLimiter::new(100, 3);
        for _ in 0..3 {
            assert!(limiter.check("k").is_ok());
        }
        assert_eq!(limiter.check("k"), Err(3600));
    }

    #[test]
    fn rate_limiter_isolates_clients() {
        let mut limiter = RateLimiter::new(1, 1000);
        assert!(limiter.check("ip:10.0.0.1").is_ok());
        assert!(limiter.check("ip:10.0.0.2").is_ok());
        assert_eq!(limiter.check("ip:10.0.0.1"), Err(60));
    }

    #[test]
    fn user_context_copies_session() {
        let user_id = Uuid::new_v4();
        let session = CachedSession::new(user_id, Some("a@b.co".into()), "backend-token".into());
        let user = UserContext::from_session(&session, "browser-token");
        assert_eq!(user.user_id, user_id);
        assert!(!user.is_professional);
        assert_eq!(user.actor().auth, "backend-token");
        assert_eq!(user.bearer.expose(), "browser-token");
        assert!(!format!("{user:?}").contains("backend-token"));
    }

    #[tokio::test]
    async fn blocking_runs_against_backend() {
        let ctx = ApiContext::new(Arc::new(LocalStore::in_memory().unwrap()), RateLimiter::default());
        let kind = ctx.blocking(|backend| backend.kind()).await.unwrap();
        assert_eq!(kind, "local");
    }
}
