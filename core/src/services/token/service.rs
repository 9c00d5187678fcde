//! Token lifecycle manager: the public surface of session tokens

use std::sync::Arc;

use cw_shared::config::RevocationCheckMode;

use crate::domain::entities::revocation::{RevocationReason, RevocationRecord};
use crate::domain::entities::token::{Claims, TokenKind, TokenPair};
use crate::domain::entities::user::{Role, UserId};
use crate::errors::{ErrorCategory, MalformedCause, TokenError, TokenResult};
use crate::repositories::{RevocationStore, SaveOutcome};

use super::clock::Clock;
use super::codec::{fingerprint, TokenCodec};
use super::config::TokenServiceConfig;
use super::deadline::{run_within, Deadline};
use super::traits::{AcceleratorVerdict, RevocationAccelerator};

const ACCELERATOR: &str = "revocation accelerator";
const STORE: &str = "revocation store";

/// Issues, authenticates, refreshes and revokes session tokens
///
/// Holds no mutable state of its own; every shared fact lives behind the
/// accelerator and the store, so one instance serves all requests.
pub struct TokenLifecycleManager {
    codec: TokenCodec,
    config: TokenServiceConfig,
    accelerator: Arc<dyn RevocationAccelerator>,
    store: Arc<dyn RevocationStore>,
}

impl TokenLifecycleManager {
    /// Creates a new lifecycle manager
    ///
    /// # Arguments
    ///
    /// * `config` - Signing and revocation policy
    /// * `accelerator` - Cache mirror, `NullRevocationAccelerator` when none
    /// * `store` - Durable revocation store
    /// * `clock` - Time source for issuance and expiry
    ///
    /// # Errors
    ///
    /// `TokenError::Signing` if the secret or algorithm is unusable
    pub fn new(
        config: TokenServiceConfig,
        accelerator: Arc<dyn RevocationAccelerator>,
        store: Arc<dyn RevocationStore>,
        clock: Arc<dyn Clock>,
    ) -> TokenResult<Self> {
        let codec = TokenCodec::new(&config, clock)?;

        tracing::info!(
            check_mode = ?config.revocation.check_mode,
            accelerator_fail_open = config.revocation.permits_accelerator_fail_open(),
            access_ttl_secs = config.access_token_ttl.num_seconds(),
            refresh_ttl_secs = config.refresh_token_ttl.num_seconds(),
            "Token lifecycle manager initialised"
        );

        Ok(Self {
            codec,
            config,
            accelerator,
            store,
        })
    }

    /// Lifetime of the access tokens this manager mints
    pub fn access_token_lifetime(&self) -> chrono::Duration {
        self.codec.lifetime(TokenKind::Access)
    }

    /// Whether `refresh_token` is a live refresh token issued to `user_id`
    ///
    /// Only the signature, kind and expiry are checked; revocation is not
    /// consulted.
    pub fn owns_refresh_token(&self, refresh_token: &str, user_id: UserId) -> TokenResult<bool> {
        let claims = self.codec.parse(refresh_token, TokenKind::Refresh)?;
        Ok(claims.user_id() == Some(user_id))
    }

    /// Mints an access and a refresh token for one identity
    ///
    /// No persistence is involved.
    pub fn issue_session(
        &self,
        user_id: UserId,
        email: &str,
        role: Role,
    ) -> TokenResult<TokenPair> {
        let access_token = self
            .codec
            .issue(user_id, email, role, TokenKind::Access)
            .inspect_err(log_signing_failure)?;
        let refresh_token = self
            .codec
            .issue(user_id, email, role, TokenKind::Refresh)
            .inspect_err(log_signing_failure)?;

        tracing::debug!(user_id = %user_id, role = %role, "Issued session");

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.codec.lifetime(TokenKind::Access),
            self.codec.lifetime(TokenKind::Refresh),
        ))
    }

    /// Verifies an access token and confirms it has not been revoked
    ///
    /// # Returns
    ///
    /// * `Ok(Claims)` - Token is valid
    /// * `Err(TokenError)` - Malformed, expired, revoked, or the revocation
    ///   state could not be established
    pub async fn authenticate(&self, token: &str, deadline: Deadline) -> TokenResult<Claims> {
        let claims = self
            .codec
            .parse(token, TokenKind::Access)
            .inspect_err(|e| log_rejection("authenticate", token, e))?;

        self.ensure_not_revoked(token, &claims, deadline, "authenticate")
            .await
            .inspect_err(|e| log_rejection("authenticate", token, e))?;

        Ok(claims)
    }

    /// Mints a fresh access token from a refresh token
    ///
    /// The refresh token itself is not rotated.
    pub async fn refresh(&self, refresh_token: &str, deadline: Deadline) -> TokenResult<String> {
        let claims = self
            .codec
            .parse(refresh_token, TokenKind::Refresh)
            .inspect_err(|e| log_rejection("refresh", refresh_token, e))?;

        self.ensure_not_revoked(refresh_token, &claims, deadline, "refresh")
            .await
            .inspect_err(|e| log_rejection("refresh", refresh_token, e))?;

        let user_id = claims.user_id().ok_or_else(|| {
            TokenError::malformed(MalformedCause::InvalidClaims, "subject is not a user id")
        })?;
        let access_token = self
            .codec
            .issue(user_id, &claims.email, claims.role, TokenKind::Access)
            .inspect_err(log_signing_failure)?;

        tracing::debug!(user_id = %user_id, "Refreshed access token");
        Ok(access_token)
    }

    /// Records a token as revoked
    ///
    /// The accelerator write is best-effort. The call succeeds if and only
    /// if the durable store holds the revocation afterwards; revoking a
    /// revoked token succeeds.
    pub async fn revoke(
        &self,
        token: &str,
        user_id: UserId,
        reason: RevocationReason,
        deadline: Deadline,
    ) -> TokenResult<()> {
        if token.trim().is_empty() {
            let error = TokenError::malformed(MalformedCause::Empty, "token is empty");
            log_rejection("revoke", token, &error);
            return Err(error);
        }

        let fp = fingerprint(token);
        let now = self.codec.now();
        let expires_at = match self.codec.expiry_of(token) {
            Some(expires_at) => expires_at,
            None => {
                tracing::info!(
                    token = %fp,
                    "Revoking a token whose expiry cannot be read, using fallback TTL"
                );
                now + self.config.fallback_ttl()
            }
        };

        match (expires_at - now).to_std() {
            Ok(ttl) if !ttl.is_zero() => {
                let mirrored = run_within(
                    ACCELERATOR,
                    deadline,
                    self.config.accelerator_timeout(),
                    self.accelerator.mark_revoked(token, ttl),
                )
                .await;
                if let Err(e) = mirrored {
                    tracing::warn!(token = %fp, error = %e, "Failed to mirror revocation");
                }
            }
            _ => tracing::debug!(token = %fp, "Token already expired, not mirrored"),
        }

        let record = RevocationRecord::new(token, user_id, reason, now, expires_at);
        let outcome = run_within(
            STORE,
            deadline,
            self.config.store_timeout(),
            self.store.save(&record),
        )
        .await
        .map_err(|e| {
            tracing::error!(token = %fp, error = %e, "Failed to persist revocation");
            TokenError::store_unavailable("revoke", e)
        })?;

        match outcome {
            SaveOutcome::Recorded => tracing::info!(
                token = %fp,
                user_id = %user_id,
                reason = %record.reason,
                "Token revoked"
            ),
            SaveOutcome::AlreadyRevoked => {
                tracing::debug!(token = %fp, "Token was already revoked")
            }
        }

        Ok(())
    }

    /// Accelerator first, then the durable store unless policy allows
    /// trusting the accelerator's answer
    async fn ensure_not_revoked(
        &self,
        token: &str,
        claims: &Claims,
        deadline: Deadline,
        operation: &'static str,
    ) -> TokenResult<()> {
        let policy = &self.config.revocation;

        let verdict = run_within(
            ACCELERATOR,
            deadline,
            self.config.accelerator_timeout(),
            self.accelerator.is_revoked(token),
        )
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(
                token = %fingerprint(token),
                operation,
                error = %e,
                "Revocation accelerator lookup failed"
            );
            AcceleratorVerdict::Unknown
        });

        match verdict {
            AcceleratorVerdict::Revoked => return Err(TokenError::Revoked),
            AcceleratorVerdict::NotRevoked
                if policy.check_mode == RevocationCheckMode::AcceleratorTrusted =>
            {
                return Ok(())
            }
            AcceleratorVerdict::Unknown if policy.permits_accelerator_fail_open() => {
                tracing::warn!(
                    token = %fingerprint(token),
                    operation,
                    "Accelerator unavailable, accepting token without durable check"
                );
                return Ok(());
            }
            _ => {}
        }

        let revoked = run_within(
            STORE,
            deadline,
            self.config.store_timeout(),
            self.store.is_revoked(token),
        )
        .await
        .map_err(|e| TokenError::store_unavailable(format!("{operation} revocation check"), e))?;

        if !revoked {
            return Ok(());
        }

        if verdict == AcceleratorVerdict::NotRevoked {
            self.repair_mirror(token, claims, deadline).await;
        }
        Err(TokenError::Revoked)
    }

    /// Put a durable revocation back into an accelerator that lost it
    async fn repair_mirror(&self, token: &str, claims: &Claims, deadline: Deadline) {
        let Ok(ttl) = claims.remaining_lifetime(self.codec.now()).to_std() else {
            return;
        };
        if ttl.is_zero() {
            return;
        }

        let repaired = run_within(
            ACCELERATOR,
            deadline,
            self.config.accelerator_timeout(),
            self.accelerator.mark_revoked(token, ttl),
        )
        .await;
        if let Err(e) = repaired {
            tracing::debug!(token = %fingerprint(token), error = %e, "Mirror repair skipped");
        }
    }
}

fn log_rejection(operation: &'static str, token: &str, error: &TokenError) {
    let fp = fingerprint(token);
    match error.category() {
        ErrorCategory::Temporal => {
            tracing::debug!(operation, token = %fp, "Rejected expired token")
        }
        ErrorCategory::Input | ErrorCategory::Cryptographic => {
            tracing::info!(operation, token = %fp, error = %error, "Rejected malformed token")
        }
        ErrorCategory::Revocation => {
            tracing::warn!(operation, token = %fp, "Revoked token presented")
        }
        ErrorCategory::Infrastructure => tracing::error!(
            operation,
            token = %fp,
            error = %error,
            "Revocation state unavailable, failing closed"
        ),
    }
}

fn log_signing_failure(error: &TokenError) {
    tracing::error!(error = %error, "Failed to sign token");
}
