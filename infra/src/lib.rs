//! # Infrastructure Layer
//!
//! Concrete adapters behind the ports defined in `cw_core`:
//! - **Database**: MySQL revocation store using SQLx
//! - **Cache**: Redis revocation accelerator
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)
//! - `redis-cache`: Enable Redis caching support (default)

use std::sync::Arc;

use cw_core::errors::BackendError;
use cw_core::repositories::RevocationStore;
use cw_core::services::{NullRevocationAccelerator, RevocationAccelerator};
use cw_shared::config::{AppConfig, CacheConfig, RevocationPolicyConfig};

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Cache module - Redis client and revocation mirror
pub mod cache;

use cache::{RedisClient, RedisRevocationAccelerator};

/// Adapters the token lifecycle manager is wired with
#[derive(Clone)]
pub struct InfrastructureServices {
    pub accelerator: Arc<dyn RevocationAccelerator>,
    pub store: Arc<dyn RevocationStore>,
    #[cfg(feature = "mysql")]
    pub database: database::DatabasePool,
}

/// Initialize infrastructure services
///
/// This function sets up:
/// - Database connection pool and revocation store
/// - Redis connection for the revocation accelerator, or the null
///   accelerator when no cache is configured or reachable
#[cfg(feature = "mysql")]
pub async fn initialize(config: &AppConfig) -> Result<InfrastructureServices, InfrastructureError> {
    tracing::info!("Initializing infrastructure services...");

    let database = database::DatabasePool::new(config.database.clone()).await?;
    let store: Arc<dyn RevocationStore> =
        Arc::new(database::MySqlRevocationStore::new(database.get_pool().clone()));
    let accelerator = build_accelerator(&config.cache, &config.auth.revocation).await;

    tracing::info!("Infrastructure services initialized successfully");

    Ok(InfrastructureServices {
        accelerator,
        store,
        database,
    })
}

/// Revocation accelerator for the given cache configuration
///
/// Falls back to [`NullRevocationAccelerator`] when the cache is disabled
/// or cannot be reached at startup. The accelerator never gates startup.
pub async fn build_accelerator(
    cache: &CacheConfig,
    policy: &RevocationPolicyConfig,
) -> Arc<dyn RevocationAccelerator> {
    if !cache.enabled {
        tracing::info!("Redis disabled, revocation checks go to the durable store");
        return Arc::new(NullRevocationAccelerator);
    }

    match RedisClient::new(cache.clone()).await {
        Ok(client) => Arc::new(RedisRevocationAccelerator::new(
            client,
            policy.cache_key_prefix.clone(),
        )),
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Redis unreachable, running without revocation accelerator"
            );
            Arc::new(NullRevocationAccelerator)
        }
    }
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation did not finish in time
    #[error("Timed out after {0}ms")]
    Timeout(u64),
}

impl InfrastructureError {
    /// Port-level error for a failure of `backend`
    pub fn into_backend(self, backend: &'static str) -> BackendError {
        match self {
            InfrastructureError::Timeout(after_ms) => BackendError::Timeout { backend, after_ms },
            InfrastructureError::Database(sqlx::Error::PoolTimedOut) => {
                BackendError::unavailable(backend, "connection pool timed out")
            }
            other => BackendError::unavailable(backend, other.to_string()),
        }
    }
}
