//! Configuration for the token service

use chrono::Duration;
use jsonwebtoken::Algorithm;
use std::str::FromStr;

use cw_shared::config::{AuthConfig, ConfigError, RevocationPolicyConfig, MAX_LIFETIME_SECS};

/// Configuration for the token service
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// JWT signing secret
    pub jwt_secret: String,
    /// JWT signing algorithm, HMAC family only
    pub algorithm: Algorithm,
    pub issuer: String,
    pub audience: String,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
    /// Revocation checking policy
    pub revocation: RevocationPolicyConfig,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "development-secret-please-change-in-production".to_string(),
            algorithm: Algorithm::HS256,
            issuer: "charityworks".to_string(),
            audience: "charityworks-api".to_string(),
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(7),
            revocation: RevocationPolicyConfig::default(),
        }
    }
}

impl TokenServiceConfig {
    /// Build from the application's authentication configuration
    pub fn from_auth_config(auth: &AuthConfig) -> Result<Self, ConfigError> {
        auth.validate()?;

        let algorithm = Algorithm::from_str(&auth.jwt.algorithm).map_err(|_| {
            ConfigError::Invalid {
                key: "JWT_ALGORITHM".to_string(),
                reason: format!("unknown algorithm {}", auth.jwt.algorithm),
            }
        })?;

        Ok(Self {
            jwt_secret: auth.jwt.secret.clone(),
            algorithm,
            issuer: auth.jwt.issuer.clone(),
            audience: auth.jwt.audience.clone(),
            access_token_ttl: Duration::seconds(auth.jwt.access_token_expiry),
            refresh_token_ttl: Duration::seconds(auth.jwt.refresh_token_expiry),
            revocation: auth.revocation.clone(),
        })
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = secret.into();
        self
    }

    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    pub fn with_revocation_policy(mut self, policy: RevocationPolicyConfig) -> Self {
        self.revocation = policy;
        self
    }

    pub(crate) fn accelerator_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.revocation.accelerator_timeout_ms)
    }

    pub(crate) fn store_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.revocation.store_timeout_ms)
    }

    /// Clamped so a policy set without validation cannot overflow.
    pub(crate) fn fallback_ttl(&self) -> Duration {
        let seconds = i64::try_from(self.revocation.fallback_ttl_seconds)
            .unwrap_or(MAX_LIFETIME_SECS)
            .min(MAX_LIFETIME_SECS);
        Duration::seconds(seconds)
    }
}
