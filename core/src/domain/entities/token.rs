//! Token entities for JWT-based authentication.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::{Role, UserId};

/// Token type reported to clients alongside a token pair
pub const BEARER: &str = "Bearer";

/// Which expiry policy a token was minted under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Authorizes resource access directly
    Access,
    /// Only usable to mint new access tokens
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims structure for JWT payload
///
/// Timestamps are NumericDate values: whole seconds on the wire when the
/// instant falls on a second, fractional seconds otherwise. They are kept
/// at microsecond resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (decimal user ID)
    pub sub: String,

    /// Display-only email address
    pub email: String,

    pub role: Role,

    /// Token kind discriminant
    pub typ: TokenKind,

    /// Issued at timestamp
    #[serde(with = "numeric_date")]
    pub iat: DateTime<Utc>,

    /// Expiration timestamp
    #[serde(with = "numeric_date")]
    pub exp: DateTime<Utc>,

    /// Not before timestamp
    #[serde(with = "numeric_date")]
    pub nbf: DateTime<Utc>,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// JWT ID (unique identifier for the token)
    pub jti: String,
}

impl Claims {
    /// Creates claims for a token minted at `issued_at` that lives for `lifetime`
    ///
    /// The issue time is truncated and the expiry rounded up to the
    /// microsecond, so a token never expires before `lifetime` has elapsed.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: UserId,
        email: impl Into<String>,
        role: Role,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        let iat = numeric_date::floor(issued_at);

        Self {
            sub: user_id.to_string(),
            email: email.into(),
            role,
            typ: kind,
            iat,
            exp: numeric_date::ceil(issued_at + lifetime),
            nbf: iat,
            iss: issuer.into(),
            aud: audience.into(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Gets the user ID from the claims
    ///
    /// `None` if the subject is not a positive integer.
    pub fn user_id(&self) -> Option<UserId> {
        self.sub.parse().ok()
    }

    /// A token is expired from the instant its `exp` is reached
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.exp
    }

    /// Time left until expiry, zero once expired
    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> Duration {
        if self.exp > now {
            self.exp - now
        } else {
            Duration::zero()
        }
    }
}

/// NumericDate (RFC 7519 §2) encoding at microsecond resolution
pub(crate) mod numeric_date {
    use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    const MICROS_PER_SEC: i64 = 1_000_000;

    pub(crate) fn floor(instant: DateTime<Utc>) -> DateTime<Utc> {
        let nanos = instant.nanosecond();
        instant.with_nanosecond(nanos - nanos % 1_000).unwrap_or(instant)
    }

    pub(crate) fn ceil(instant: DateTime<Utc>) -> DateTime<Utc> {
        let floored = floor(instant);
        if floored == instant {
            instant
        } else {
            floored + Duration::microseconds(1)
        }
    }

    pub(crate) fn serialize<S: Serializer>(
        instant: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let micros = i64::from(instant.timestamp_subsec_micros());
        if micros == 0 {
            serializer.serialize_i64(instant.timestamp())
        } else {
            serializer
                .serialize_f64(instant.timestamp() as f64 + micros as f64 / MICROS_PER_SEC as f64)
        }
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        deserializer.deserialize_any(NumericDateVisitor)
    }

    struct NumericDateVisitor;

    impl<'de> Visitor<'de> for NumericDateVisitor {
        type Value = DateTime<Utc>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a NumericDate in seconds since the Unix epoch")
        }

        fn visit_i64<E: de::Error>(self, secs: i64) -> Result<Self::Value, E> {
            Utc.timestamp_opt(secs, 0)
                .single()
                .ok_or_else(|| E::custom("NumericDate out of range"))
        }

        fn visit_u64<E: de::Error>(self, secs: u64) -> Result<Self::Value, E> {
            let secs = i64::try_from(secs).map_err(|_| E::custom("NumericDate out of range"))?;
            self.visit_i64(secs)
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            if !value.is_finite() || value.abs() > i64::MAX as f64 / MICROS_PER_SEC as f64 {
                return Err(E::custom("NumericDate out of range"));
            }
            let micros = (value * MICROS_PER_SEC as f64).round() as i64;
            Utc.timestamp_micros(micros)
                .single()
                .ok_or_else(|| E::custom("NumericDate out of range"))
        }
    }
}

/// Token pair returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// JWT access token
    pub access_token: String,

    /// JWT refresh token
    pub refresh_token: String,

    /// Always `Bearer`
    pub token_type: String,

    /// Access token expiry time in seconds
    pub access_expires_in: i64,

    /// Refresh token expiry time in seconds
    pub refresh_expires_in: i64,
}

impl TokenPair {
    pub fn new(
        access_token: String,
        refresh_token: String,
        access_lifetime: Duration,
        refresh_lifetime: Duration,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: BEARER.to_string(),
            access_expires_in: access_lifetime.num_seconds(),
            refresh_expires_in: refresh_lifetime.num_seconds(),
        }
    }
}
