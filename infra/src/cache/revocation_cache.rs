//! Redis-backed revocation accelerator
//!
//! Key pattern: `{prefix}{token}` holding the sentinel `"1"`, expiring with
//! the token. A missing key is a definite "not revoked" from a healthy
//! cache; any Redis failure is reported so the caller can fall back.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use cw_core::errors::BackendError;
use cw_core::services::{AcceleratorVerdict, RevocationAccelerator};

use crate::cache::RedisClient;

const BACKEND: &str = "redis";
const SENTINEL: &str = "1";

/// Revocation accelerator on top of [`RedisClient`]
#[derive(Clone)]
pub struct RedisRevocationAccelerator {
    client: RedisClient,
    key_prefix: String,
}

impl RedisRevocationAccelerator {
    pub fn new(client: RedisClient, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    pub fn key_for(&self, token: &str) -> String {
        format!("{}{}", self.key_prefix, token)
    }

    pub fn client(&self) -> &RedisClient {
        &self.client
    }
}

/// Whole seconds, rounded up so the entry never expires before the token
pub(crate) fn expiry_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

#[async_trait]
impl RevocationAccelerator for RedisRevocationAccelerator {
    async fn mark_revoked(&self, token: &str, ttl: Duration) -> Result<(), BackendError> {
        let seconds = expiry_seconds(ttl);
        self.client
            .set_with_expiry(&self.key_for(token), SENTINEL, seconds)
            .await
            .map_err(|e| e.into_backend(BACKEND))?;

        debug!(ttl_secs = seconds, "Revocation mirrored to Redis");
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<AcceleratorVerdict, BackendError> {
        let value = self
            .client
            .get(&self.key_for(token))
            .await
            .map_err(|e| e.into_backend(BACKEND))?;

        Ok(match value {
            Some(_) => AcceleratorVerdict::Revoked,
            None => AcceleratorVerdict::NotRevoked,
        })
    }
}
