//! Null and in-memory revocation accelerators

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::clock::Clock;
use super::traits::{AcceleratorVerdict, RevocationAccelerator};
use crate::errors::BackendError;

/// Stands in when no cache is configured
///
/// Writes are dropped and every lookup answers `Unknown`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRevocationAccelerator;

#[async_trait]
impl RevocationAccelerator for NullRevocationAccelerator {
    async fn mark_revoked(&self, _token: &str, _ttl: Duration) -> Result<(), BackendError> {
        Ok(())
    }

    async fn is_revoked(&self, _token: &str) -> Result<AcceleratorVerdict, BackendError> {
        Ok(AcceleratorVerdict::Unknown)
    }
}

/// Process-local accelerator with TTL expiry against the injected clock
///
/// Used in tests and local development. Clones share entries.
#[derive(Clone)]
pub struct InMemoryRevocationAccelerator {
    entries: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
    available: Arc<AtomicBool>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRevocationAccelerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
            clock,
        }
    }

    /// Drop every entry, as a cache restart would
    pub async fn wipe(&self) {
        self.entries.write().await.clear();
    }

    /// Simulate an outage; calls fail with `BackendError::Unavailable`
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .read()
            .await
            .values()
            .filter(|expires_at| **expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn ensure_available(&self) -> Result<(), BackendError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::unavailable("memory accelerator", "switched off"))
        }
    }
}

#[async_trait]
impl RevocationAccelerator for InMemoryRevocationAccelerator {
    async fn mark_revoked(&self, token: &str, ttl: Duration) -> Result<(), BackendError> {
        self.ensure_available()?;
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| BackendError::unavailable("memory accelerator", e.to_string()))?;
        let expires_at = self.clock.now() + ttl;

        let mut entries = self.entries.write().await;
        entries.retain(|_, at| *at > self.clock.now());
        entries.insert(token.to_string(), expires_at);
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<AcceleratorVerdict, BackendError> {
        self.ensure_available()?;
        let now = self.clock.now();
        let verdict = match self.entries.read().await.get(token) {
            Some(expires_at) if *expires_at > now => AcceleratorVerdict::Revoked,
            _ => AcceleratorVerdict::NotRevoked,
        };
        Ok(verdict)
    }
}
