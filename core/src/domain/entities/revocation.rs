//! Revocation records: the durable marker that a token is no longer valid.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::user::UserId;

/// Why a token was revoked
///
/// Stored as a plain string, so unknown values read back from the
/// database survive as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RevocationReason {
    Logout,
    AdminRevocation,
    PasswordChange,
    Compromised,
    Other(String),
}

impl RevocationReason {
    pub fn as_str(&self) -> &str {
        match self {
            RevocationReason::Logout => "logout",
            RevocationReason::AdminRevocation => "admin_revocation",
            RevocationReason::PasswordChange => "password_change",
            RevocationReason::Compromised => "compromised",
            RevocationReason::Other(reason) => reason,
        }
    }
}

impl From<&str> for RevocationReason {
    fn from(value: &str) -> Self {
        match value {
            "logout" => RevocationReason::Logout,
            "admin_revocation" => RevocationReason::AdminRevocation,
            "password_change" => RevocationReason::PasswordChange,
            "compromised" => RevocationReason::Compromised,
            other => RevocationReason::Other(other.to_string()),
        }
    }
}

impl From<String> for RevocationReason {
    fn from(value: String) -> Self {
        RevocationReason::from(value.as_str())
    }
}

impl From<RevocationReason> for String {
    fn from(reason: RevocationReason) -> Self {
        reason.as_str().to_string()
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A revoked token, as persisted in the durable store
///
/// Created once and never updated. Presence of the record is the revoked
/// marker; `expires_at` lets retention housekeeping drop it once the
/// token could no longer validate anyway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationRecord {
    /// The token string exactly as presented
    pub token: String,

    pub user_id: UserId,

    pub reason: RevocationReason,

    pub blacklisted_at: DateTime<Utc>,

    /// Token expiry, or blacklisting time plus the fallback TTL when the
    /// expiry could not be read
    pub expires_at: DateTime<Utc>,
}

impl RevocationRecord {
    pub fn new(
        token: impl Into<String>,
        user_id: UserId,
        reason: RevocationReason,
        blacklisted_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token: token.into(),
            user_id,
            reason,
            blacklisted_at,
            expires_at,
        }
    }

    /// Whether housekeeping may drop this record
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
