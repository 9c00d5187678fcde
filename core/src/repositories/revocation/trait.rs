//! Revocation store trait: the durable source of truth for revoked tokens.

use async_trait::async_trait;

use crate::domain::entities::revocation::RevocationRecord;
use crate::errors::BackendError;

/// Result of persisting a revocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new record was written
    Recorded,
    /// The token was already revoked; nothing changed
    AlreadyRevoked,
}

/// Repository trait for revocation records
///
/// Implementations back onto a relational table keyed by the token string.
/// Both operations are single-key and rely on the store's own atomicity.
///
/// # Contract
/// - `save` is idempotent: a second save of the same token reports
///   `AlreadyRevoked`, never an error
/// - failures must be surfaced, the caller decides whether they are fatal
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Persist a revocation record
    ///
    /// # Returns
    /// * `Ok(SaveOutcome::Recorded)` - Record written
    /// * `Ok(SaveOutcome::AlreadyRevoked)` - Token was already present
    /// * `Err(BackendError)` - Store unreachable or write failed
    async fn save(&self, record: &RevocationRecord) -> Result<SaveOutcome, BackendError>;

    /// Existence check by token string
    async fn is_revoked(&self, token: &str) -> Result<bool, BackendError>;
}
