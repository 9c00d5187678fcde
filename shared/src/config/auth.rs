//! Authentication configuration: token signing and revocation policy

use serde::{Deserialize, Serialize};

use super::ConfigError;

const DEFAULT_SECRET: &str = "development-secret-please-change-in-production";

/// Algorithms accepted for signing. Only the HMAC family is supported.
pub const SUPPORTED_ALGORITHMS: [&str; 3] = ["HS256", "HS384", "HS512"];

/// Upper bound for any configured lifetime, in seconds (ten years).
pub const MAX_LIFETIME_SECS: i64 = 10 * 365 * 86_400;

/// JWT signing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// JWT secret key for signing tokens
    pub secret: String,

    /// Access token expiry time in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiry time in seconds
    pub refresh_token_expiry: i64,

    /// JWT issuer claim
    pub issuer: String,

    /// JWT audience claim
    pub audience: String,

    /// Algorithm for JWT signing (default: HS256)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::from(DEFAULT_SECRET),
            access_token_expiry: 900,      // 15 minutes
            refresh_token_expiry: 604_800, // 7 days
            issuer: String::from("charityworks"),
            audience: String::from("charityworks-api"),
            algorithm: default_algorithm(),
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Set access token expiry in seconds
    pub fn with_access_expiry_seconds(mut self, seconds: i64) -> Self {
        self.access_token_expiry = seconds;
        self
    }

    /// Set refresh token expiry in days
    pub fn with_refresh_expiry_days(mut self, days: i64) -> Self {
        self.refresh_token_expiry = days * 86_400;
        self
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::Missing {
                key: "JWT_SECRET".to_string(),
            });
        }
        if !SUPPORTED_ALGORITHMS.contains(&self.algorithm.as_str()) {
            return Err(ConfigError::invalid(
                "JWT_ALGORITHM",
                format!("{} is not an HMAC algorithm", self.algorithm),
            ));
        }
        if self.access_token_expiry <= 0 {
            return Err(ConfigError::invalid("JWT_ACCESS_TOKEN_EXPIRY", "must be positive"));
        }
        if self.refresh_token_expiry < self.access_token_expiry {
            return Err(ConfigError::invalid(
                "JWT_REFRESH_TOKEN_EXPIRY",
                "must not be shorter than the access token expiry",
            ));
        }
        if self.refresh_token_expiry > MAX_LIFETIME_SECS {
            return Err(ConfigError::invalid(
                "JWT_REFRESH_TOKEN_EXPIRY",
                format!("must not exceed {} seconds", MAX_LIFETIME_SECS),
            ));
        }
        Ok(())
    }
}

/// How far `authenticate` goes before trusting a token as not revoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationCheckMode {
    /// Every accelerator miss is confirmed against the durable store
    Strict,
    /// A healthy accelerator miss is trusted; only an unavailable
    /// accelerator sends the check to the durable store
    AcceleratorTrusted,
}

impl std::str::FromStr for RevocationCheckMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "accelerator_trusted" | "trusted" => Ok(Self::AcceleratorTrusted),
            _ => Err(format!("Invalid revocation check mode: {}", s)),
        }
    }
}

/// Revocation checking policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RevocationPolicyConfig {
    #[serde(default = "default_check_mode")]
    pub check_mode: RevocationCheckMode,

    /// Accept the token when the accelerator is unavailable instead of
    /// consulting the durable store. Ignored in strict mode.
    #[serde(default)]
    pub accelerator_fail_open: bool,

    /// Upper bound for a single accelerator round-trip in milliseconds
    #[serde(default = "default_accelerator_timeout")]
    pub accelerator_timeout_ms: u64,

    /// Upper bound for a single durable store round-trip in milliseconds
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,

    /// Mirror TTL used when the revoked token's expiry cannot be read
    #[serde(default = "default_fallback_ttl")]
    pub fallback_ttl_seconds: u64,

    /// Key prefix for accelerator entries
    #[serde(default = "default_key_prefix")]
    pub cache_key_prefix: String,
}

impl Default for RevocationPolicyConfig {
    fn default() -> Self {
        Self {
            check_mode: default_check_mode(),
            accelerator_fail_open: false,
            accelerator_timeout_ms: default_accelerator_timeout(),
            store_timeout_ms: default_store_timeout(),
            fallback_ttl_seconds: default_fallback_ttl(),
            cache_key_prefix: default_key_prefix(),
        }
    }
}

impl RevocationPolicyConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            check_mode: std::env::var("REVOCATION_CHECK_MODE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.check_mode),
            accelerator_fail_open: env_or(
                "REVOCATION_ACCELERATOR_FAIL_OPEN",
                defaults.accelerator_fail_open,
            ),
            accelerator_timeout_ms: env_or(
                "REVOCATION_ACCELERATOR_TIMEOUT_MS",
                defaults.accelerator_timeout_ms,
            ),
            store_timeout_ms: env_or("REVOCATION_STORE_TIMEOUT_MS", defaults.store_timeout_ms),
            fallback_ttl_seconds: env_or("REVOCATION_FALLBACK_TTL", defaults.fallback_ttl_seconds),
            cache_key_prefix: std::env::var("REVOCATION_KEY_PREFIX")
                .unwrap_or(defaults.cache_key_prefix),
        }
    }

    /// Whether an accelerator outage may be accepted without a durable lookup
    pub fn permits_accelerator_fail_open(&self) -> bool {
        self.check_mode == RevocationCheckMode::AcceleratorTrusted && self.accelerator_fail_open
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::invalid("REVOCATION_STORE_TIMEOUT_MS", "must be positive"));
        }
        if self.fallback_ttl_seconds == 0 {
            return Err(ConfigError::invalid("REVOCATION_FALLBACK_TTL", "must be positive"));
        }
        if self.fallback_ttl_seconds > MAX_LIFETIME_SECS as u64 {
            return Err(ConfigError::invalid(
                "REVOCATION_FALLBACK_TTL",
                format!("must not exceed {} seconds", MAX_LIFETIME_SECS),
            ));
        }
        Ok(())
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,

    /// Revocation policy
    #[serde(default)]
    pub revocation: RevocationPolicyConfig,
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = JwtConfig::default();
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").unwrap_or(defaults.secret),
            access_token_expiry: env_or("JWT_ACCESS_TOKEN_EXPIRY", defaults.access_token_expiry),
            refresh_token_expiry: env_or("JWT_REFRESH_TOKEN_EXPIRY", defaults.refresh_token_expiry),
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or(defaults.audience),
            algorithm: std::env::var("JWT_ALGORITHM").unwrap_or(defaults.algorithm),
        };

        Self {
            jwt,
            revocation: RevocationPolicyConfig::from_env(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;
        self.revocation.validate()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn default_algorithm() -> String {
    String::from("HS256")
}

fn default_check_mode() -> RevocationCheckMode {
    RevocationCheckMode::Strict
}

fn default_accelerator_timeout() -> u64 {
    50
}

fn default_store_timeout() -> u64 {
    500
}

fn default_fallback_ttl() -> u64 {
    604_800 // 7 days, the longest token lifetime
}

fn default_key_prefix() -> String {
    String::from("blacklist:")
}
