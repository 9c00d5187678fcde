//! MySQL implementation of the RevocationStore trait.
//!
//! Rows live in `token_blacklist`. The unique index is on the SHA-256 of
//! the token, so lookups are exact matches on the full token string.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::{MySqlPool, Row};

use cw_core::domain::entities::revocation::{RevocationReason, RevocationRecord};
use cw_core::domain::entities::user::UserId;
use cw_core::errors::BackendError;
use cw_core::repositories::{RevocationStore, SaveOutcome};

use crate::InfrastructureError;

const BACKEND: &str = "mysql";

/// Width of `token_blacklist.reason`, in characters
const REASON_COLUMN_CHARS: usize = 64;

/// MySQL implementation of RevocationStore
pub struct MySqlRevocationStore {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlRevocationStore {
    /// Create a new MySQL revocation store
    ///
    /// # Arguments
    /// * `pool` - MySQL connection pool from SQLx
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Hash a token value using SHA-256
    ///
    /// # Returns
    /// Hexadecimal string representation of the SHA-256 hash
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Load the stored record for a token
    pub async fn find_record(&self, token: &str) -> Result<Option<RevocationRecord>, BackendError> {
        let query = r#"
            SELECT token, user_id, reason, blacklisted_at, expires_at
            FROM token_blacklist
            WHERE token_hash = ?
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(Self::hash_token(token))
            .fetch_optional(&self.pool)
            .await
            .map_err(backend_error)?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    /// Convert database row to RevocationRecord entity
    fn row_to_record(row: &sqlx::mysql::MySqlRow) -> Result<RevocationRecord, BackendError> {
        let user_id: i64 = row.try_get("user_id").map_err(backend_error)?;
        let user_id = UserId::new(user_id).ok_or_else(|| {
            BackendError::unavailable(
                BACKEND,
                format!("stored user id {} is out of range", user_id),
            )
        })?;
        let reason: String = row.try_get("reason").map_err(backend_error)?;

        Ok(RevocationRecord {
            token: row.try_get("token").map_err(backend_error)?,
            user_id,
            reason: RevocationReason::from(reason),
            blacklisted_at: row
                .try_get::<DateTime<Utc>, _>("blacklisted_at")
                .map_err(backend_error)?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(backend_error)?,
        })
    }
}

fn backend_error(e: sqlx::Error) -> BackendError {
    InfrastructureError::Database(e).into_backend(BACKEND)
}

/// Cuts a free-text reason to the column width on a character boundary
fn bounded_reason(reason: &str) -> &str {
    match reason.char_indices().nth(REASON_COLUMN_CHARS) {
        Some((end, _)) => &reason[..end],
        None => reason,
    }
}

fn is_duplicate_key(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl RevocationStore for MySqlRevocationStore {
    async fn save(&self, record: &RevocationRecord) -> Result<SaveOutcome, BackendError> {
        let reason = bounded_reason(record.reason.as_str());
        if reason.len() < record.reason.as_str().len() {
            tracing::warn!(
                user_id = %record.user_id,
                "Revocation reason longer than {} characters, storing a prefix",
                REASON_COLUMN_CHARS
            );
        }

        // Plain INSERT: only the unique index on token_hash may turn a
        // failure into AlreadyRevoked
        let query = r#"
            INSERT INTO token_blacklist (
                token_hash, token, user_id, reason, blacklisted_at, expires_at
            ) VALUES (?, ?, ?, ?, ?, ?)
        "#;

        let result = sqlx::query(query)
            .bind(Self::hash_token(&record.token))
            .bind(&record.token)
            .bind(record.user_id.get())
            .bind(reason)
            .bind(record.blacklisted_at)
            .bind(record.expires_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(SaveOutcome::Recorded),
            Err(e) if is_duplicate_key(&e) => Ok(SaveOutcome::AlreadyRevoked),
            Err(e) => {
                tracing::error!(error = %e, "Failed to insert revocation record");
                Err(backend_error(e))
            }
        }
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, BackendError> {
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM token_blacklist WHERE token_hash = ? LIMIT 1")
                .bind(Self::hash_token(token))
                .fetch_optional(&self.pool)
                .await
                .map_err(backend_error)?;

        Ok(exists.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_hex_sha256() {
        let hash = MySqlRevocationStore::hash_token("abc");

        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_reason_is_bounded_to_column_width() {
        assert_eq!(bounded_reason("logout"), "logout");

        let exact = "r".repeat(REASON_COLUMN_CHARS);
        assert_eq!(bounded_reason(&exact), exact);

        let long = format!("{}tail", "é".repeat(REASON_COLUMN_CHARS));
        let bounded = bounded_reason(&long);
        assert_eq!(bounded.chars().count(), REASON_COLUMN_CHARS);
        assert!(bounded.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_only_database_errors_count_as_duplicates() {
        assert!(!is_duplicate_key(&sqlx::Error::RowNotFound));
        assert!(!is_duplicate_key(&sqlx::Error::PoolTimedOut));
    }

    #[test]
    fn test_distinct_tokens_hash_apart() {
        assert_ne!(
            MySqlRevocationStore::hash_token("a.b.c"),
            MySqlRevocationStore::hash_token("a.b.d")
        );
    }
}
