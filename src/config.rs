use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

/// Application-level constants
pub const APP_NAME: &str = "Skill Links";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix of every environment variable read by [`AppConfig`].
pub const ENV_PREFIX: &str = "SKILL_LINKS_";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "skill_links=info,tower_http=warn"
}

/// Get the application data directory (~/SkillLinks/).
/// Falls back to the working directory when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("SkillLinks")
}

/// Default path of the local SQLite store.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("marketplace.db")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
    #[error("{present} is set but {missing} is missing")]
    Incomplete { present: String, missing: String },
}

/// Where marketplace data lives.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendMode {
    /// Managed backend reached over REST.
    Remote { url: String, anon_key: String },
    /// SQLite file on this machine.
    Local { database_path: PathBuf },
}

impl BackendMode {
    pub fn kind(&self) -> &'static str {
        match self {
            BackendMode::Remote { .. } => "remote",
            BackendMode::Local { .. } => "local",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub backend: BackendMode,
    pub request_timeout: Duration,
    /// Sample professionals generated into an empty local store at startup.
    pub seed_count: u32,
    pub rate_per_minute: u32,
    pub rate_per_hour: u32,
    /// Allowed browser origin for CORS. Same-origin only when unset.
    pub allowed_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url_key = format!("{ENV_PREFIX}BACKEND_URL");
        let anon_key_key = format!("{ENV_PREFIX}ANON_KEY");

        let backend = match (lookup(&url_key), lookup(&anon_key_key)) {
            (Some(url), Some(anon_key)) => BackendMode::Remote {
                url: url.trim_end_matches('/').to_string(),
                anon_key,
            },
            (Some(_), None) => {
                return Err(ConfigError::Incomplete {
                    present: url_key,
                    missing: anon_key_key,
                })
            }
            (None, _) => {
                let database_path = lookup(&format!("{ENV_PREFIX}DATABASE"))
                    .map(PathBuf::from)
                    .unwrap_or_else(|| {
                        let path = default_database_path();
                        info!("{ENV_PREFIX}DATABASE not set, using default: {}", path.display());
                        path
                    });
                BackendMode::Local { database_path }
            }
        };

        let timeout_secs: u64 = try_load(&lookup, "REQUEST_TIMEOUT_SECS", "15")?;

        Ok(Self {
            bind_addr: try_load(&lookup, "BIND", "127.0.0.1:8787")?,
            backend,
            request_timeout: Duration::from_secs(timeout_secs),
            seed_count: try_load(&lookup, "SEED_COUNT", "0")?,
            rate_per_minute: try_load(&lookup, "RATE_PER_MINUTE", "120")?,
            rate_per_hour: try_load(&lookup, "RATE_PER_HOUR", "2000")?,
            allowed_origin: lookup(&format!("{ENV_PREFIX}ALLOWED_ORIGIN")),
        })
    }
}

fn try_load<F, T>(lookup: &F, name: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let key = format!("{ENV_PREFIX}{name}");
    let value = lookup(&key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        }
    })
}
