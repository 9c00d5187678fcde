//! Signs and parses access and refresh tokens
//!
//! Tokens are standard HMAC-signed JWTs. Expiry is checked here against the
//! injected [`Clock`] rather than by `jsonwebtoken`, so tests can move time.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::clock::Clock;
use super::config::TokenServiceConfig;
use crate::domain::entities::token::{numeric_date, Claims, TokenKind};
use crate::domain::entities::user::{Role, UserId};
use crate::errors::{MalformedCause, TokenError, TokenResult};

/// Tolerated clock skew for `nbf` between issuing and verifying hosts
const NOT_BEFORE_LEEWAY_SECS: i64 = 30;

/// Short, non-reversible token identifier for log lines
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..4])
}

/// Just enough of the payload to size a revocation
#[derive(Deserialize)]
struct ExpiryClaim {
    #[serde(with = "numeric_date")]
    exp: DateTime<Utc>,
}

/// Token Codec
///
/// Pure with respect to the configured secret and clock. Only the HMAC
/// family is accepted, and only the configured member of it.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Creates a codec
    ///
    /// # Errors
    ///
    /// `TokenError::Signing` when the secret is empty or the algorithm is
    /// not HS256, HS384 or HS512.
    pub fn new(config: &TokenServiceConfig, clock: Arc<dyn Clock>) -> TokenResult<Self> {
        if config.jwt_secret.is_empty() {
            return Err(TokenError::signing("signing secret is not configured"));
        }
        if !matches!(
            config.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(TokenError::signing(format!(
                "{:?} is not an HMAC algorithm",
                config.algorithm
            )));
        }

        let mut validation = Validation::new(config.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss", "aud"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            algorithm: config.algorithm,
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
            clock,
        })
    }

    /// Configured lifetime for a token kind
    pub fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Signs a new token of `kind` for the given identity
    pub fn issue(
        &self,
        user_id: UserId,
        email: &str,
        role: Role,
        kind: TokenKind,
    ) -> TokenResult<String> {
        let claims = Claims::new(
            user_id,
            email,
            role,
            kind,
            self.clock.now(),
            self.lifetime(kind),
            self.issuer.as_str(),
            self.audience.as_str(),
        );

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::signing(e.to_string()))
    }

    /// Verifies signature, algorithm, issuer, audience, kind and expiry
    pub fn parse(&self, token: &str, kind: TokenKind) -> TokenResult<Claims> {
        if token.trim().is_empty() {
            return Err(TokenError::malformed(MalformedCause::Empty, "token is empty"));
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                let cause = malformed_cause(e.kind());
                TokenError::malformed(cause, e.to_string())
            })?
            .claims;

        if claims.typ != kind {
            return Err(TokenError::malformed(
                MalformedCause::WrongKind,
                format!("expected {} token, got {}", kind, claims.typ),
            ));
        }
        if claims.user_id().is_none() {
            return Err(TokenError::malformed(
                MalformedCause::InvalidClaims,
                format!("subject {:?} is not a user id", claims.sub),
            ));
        }

        let now = self.clock.now();
        if now + Duration::seconds(NOT_BEFORE_LEEWAY_SECS) < claims.nbf {
            return Err(TokenError::malformed(
                MalformedCause::InvalidClaims,
                "token is not valid yet",
            ));
        }
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Expiry of a correctly signed token, whatever its kind or age
    ///
    /// `None` when the token cannot be verified.
    pub fn expiry_of(&self, token: &str) -> Option<DateTime<Utc>> {
        decode::<ExpiryClaim>(token, &self.decoding_key, &self.validation)
            .ok()
            .map(|data| data.claims.exp)
    }
}

fn malformed_cause(kind: &ErrorKind) -> MalformedCause {
    match kind {
        ErrorKind::InvalidSignature => MalformedCause::Signature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            MalformedCause::Algorithm
        }
        ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature
        | ErrorKind::ExpiredSignature
        | ErrorKind::Json(_) => MalformedCause::InvalidClaims,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
            MalformedCause::Encoding
        }
        _ => MalformedCause::Encoding,
    }
}
