pub mod api;
pub mod assistant;
pub mod backend;
pub mod booking;
pub mod categories;
pub mod config;
pub mod db;
pub mod forms;
pub mod listing;
pub mod marketplace;
pub mod models;
pub mod notice;
pub mod seed;
pub mod session;

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use crate::api::{ApiContext, RateLimiter};
use crate::backend::{BackendError, LocalStore, MarketBackend, RestBackend};
use crate::config::{AppConfig, BackendMode, ConfigError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    let backend = connect_backend(&config)?;

    // The blocking HTTP client must not be dropped inside the runtime, so
    // `backend` outlives it here.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let ctx = ApiContext::new(
        Arc::clone(&backend),
        RateLimiter::new(config.rate_per_minute, config.rate_per_hour),
    );
    let app = api::app(ctx, config.allowed_origin.as_deref());

    let result = runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
        tracing::info!(
            addr = %config.bind_addr,
            backend = config.backend.kind(),
            "API server listening"
        );
        api::serve(listener, app, api::shutdown_signal()).await
    });
    drop(runtime);

    tracing::info!("{} stopped", config::APP_NAME);
    result.map_err(StartupError::from)
}

fn connect_backend(config: &AppConfig) -> Result<Arc<dyn MarketBackend>, StartupError> {
    match &config.backend {
        BackendMode::Remote { url, anon_key } => {
            if config.seed_count > 0 {
                tracing::warn!("Sample data is only generated into a local store, skipping");
            }
            Ok(Arc::new(RestBackend::new(url, anon_key, config.request_timeout)?))
        }
        BackendMode::Local { database_path } => {
            let store = LocalStore::open(database_path)?;
            tracing::info!(path = %database_path.display(), "Local store opened");
            if config.seed_count > 0 {
                seed_if_empty(&store, config.seed_count)?;
            }
            Ok(Arc::new(store))
        }
    }
}

fn seed_if_empty(store: &LocalStore, count: u32) -> Result<(), BackendError> {
    store.with_conn(|conn| {
        let existing = db::count_professionals(conn)?;
        if existing > 0 {
            tracing::info!(existing, "Store already has professionals, skipping sample data");
            return Ok(());
        }
        let mut rng = StdRng::from_entropy();
        seed::generate(conn, count, &mut rng)?;
        Ok(())
    })
}
