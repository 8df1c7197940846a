//! Application state for memorial-cloud

use std::sync::Arc;

use crate::auth::rate_limit::RateLimiter;
use crate::config::Config;
use crate::db::Store;
use crate::db::memory::MemoryStore;
use crate::db::postgres::PgStore;
use crate::error::BoxError;
use crate::services::Services;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Entity store behind every service
    pub store: Arc<dyn Store>,
    pub services: Services,
    /// HS256 secret for user bearer tokens
    pub jwt_secret: String,
    /// Rate limiter for join-by-code and access-request routes
    pub rate_limiter: RateLimiter,
    /// Requests per IP per minute on rate-limited routes
    pub join_rate_limit: u32,
}

impl AppState {
    /// Build state over an existing store
    pub fn with_store(store: Arc<dyn Store>, jwt_secret: impl Into<String>, join_rate_limit: u32) -> Self {
        Self {
            services: Services::new(store.clone()),
            store,
            jwt_secret: jwt_secret.into(),
            rate_limiter: RateLimiter::new(),
            join_rate_limit,
        }
    }

    /// Connect the configured store and wire the services
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let store: Arc<dyn Store> = match &config.database_url {
            Some(url) => {
                let pg = PgStore::connect(url, config.database_max_connections).await?;
                tracing::info!("PostgreSQL store ready");
                Arc::new(pg)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory store (data is not persisted)");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(
            store,
            config.jwt_secret.clone(),
            config.join_rate_limit,
        ))
    }
}
