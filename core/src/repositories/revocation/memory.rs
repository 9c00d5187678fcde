//! In-memory implementation of RevocationStore for tests and local development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::revocation::RevocationRecord;
use crate::errors::BackendError;

use super::r#trait::{RevocationStore, SaveOutcome};

const BACKEND: &str = "in-memory revocation store";

/// In-memory revocation store
///
/// Clones share the same records, so a test can keep a handle while the
/// lifecycle manager owns another. `set_available(false)` simulates an
/// outage: every call then fails with `BackendError::Unavailable`.
#[derive(Clone)]
pub struct InMemoryRevocationStore {
    records: Arc<RwLock<HashMap<String, RevocationRecord>>>,
    available: Arc<AtomicBool>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn get(&self, token: &str) -> Option<RevocationRecord> {
        self.records.read().await.get(token).cloned()
    }

    fn ensure_available(&self) -> Result<(), BackendError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::unavailable(BACKEND, "store is offline"))
        }
    }
}

impl Default for InMemoryRevocationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn save(&self, record: &RevocationRecord) -> Result<SaveOutcome, BackendError> {
        self.ensure_available()?;
        let mut records = self.records.write().await;

        if records.contains_key(&record.token) {
            return Ok(SaveOutcome::AlreadyRevoked);
        }

        records.insert(record.token.clone(), record.clone());
        Ok(SaveOutcome::Recorded)
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, BackendError> {
        self.ensure_available()?;
        Ok(self.records.read().await.contains_key(token))
    }
}
