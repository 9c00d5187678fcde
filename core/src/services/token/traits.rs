//! Revocation accelerator port

use async_trait::async_trait;
use std::time::Duration;

use crate::errors::BackendError;

/// Answer from the accelerator for one token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceleratorVerdict {
    /// An entry exists, the token is revoked
    Revoked,
    /// The accelerator is healthy and holds no entry
    NotRevoked,
    /// No accelerator behind this handle, the caller must decide
    Unknown,
}

/// Volatile TTL mirror of recent revocations
///
/// Never authoritative. Losing every entry is allowed; reporting a revoked
/// token for one that was never revoked is not.
#[async_trait]
pub trait RevocationAccelerator: Send + Sync {
    /// Mirror a revocation for `ttl`
    async fn mark_revoked(&self, token: &str, ttl: Duration) -> Result<(), BackendError>;

    async fn is_revoked(&self, token: &str) -> Result<AcceleratorVerdict, BackendError>;
}
