//! Error types for token issuance, validation and revocation
//!
//! `TokenError` is the closed set of failures the lifecycle manager reports
//! upward. Callers branch on [`TokenError::kind`]; the human-readable text
//! is for logs only and never reaches end users.

use std::fmt;
use thiserror::Error;

/// Token lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The secret is unusable or the signature step failed
    #[error("Token signing failed: {reason}")]
    Signing { reason: String },

    /// Empty input, undecodable token, bad signature or unexpected algorithm
    #[error("Malformed token ({cause}): {detail}")]
    Malformed { cause: MalformedCause, detail: String },

    /// Token parsed fine but its expiry is in the past
    #[error("Token expired")]
    Expired,

    /// Token is structurally valid but explicitly revoked
    #[error("Token revoked")]
    Revoked,

    /// The durable revocation store could not be consulted or written
    #[error("Revocation store unavailable during {context}: {source}")]
    StoreUnavailable {
        context: String,
        #[source]
        source: BackendError,
    },
}

/// Discriminant for [`TokenError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenErrorKind {
    Signing,
    Malformed,
    Expired,
    Revoked,
    StoreUnavailable,
}

/// Operational category, used to pick log severity and response policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Rejected before any I/O
    Input,
    /// Signature or algorithm problems, never retried
    Cryptographic,
    /// Expiry, routine
    Temporal,
    /// Explicit revocation, security relevant
    Revocation,
    /// Cache or database unreachable
    Infrastructure,
}

/// What exactly was wrong with a malformed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MalformedCause {
    Empty,
    Encoding,
    Signature,
    Algorithm,
    WrongKind,
    InvalidClaims,
}

impl MalformedCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            MalformedCause::Empty => "empty",
            MalformedCause::Encoding => "encoding",
            MalformedCause::Signature => "signature",
            MalformedCause::Algorithm => "algorithm",
            MalformedCause::WrongKind => "wrong_kind",
            MalformedCause::InvalidClaims => "invalid_claims",
        }
    }
}

impl fmt::Display for MalformedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TokenError {
    pub fn malformed(cause: MalformedCause, detail: impl Into<String>) -> Self {
        TokenError::Malformed {
            cause,
            detail: detail.into(),
        }
    }

    pub fn signing(reason: impl Into<String>) -> Self {
        TokenError::Signing {
            reason: reason.into(),
        }
    }

    pub fn store_unavailable(context: impl Into<String>, source: BackendError) -> Self {
        TokenError::StoreUnavailable {
            context: context.into(),
            source,
        }
    }

    pub fn kind(&self) -> TokenErrorKind {
        match self {
            TokenError::Signing { .. } => TokenErrorKind::Signing,
            TokenError::Malformed { .. } => TokenErrorKind::Malformed,
            TokenError::Expired => TokenErrorKind::Expired,
            TokenError::Revoked => TokenErrorKind::Revoked,
            TokenError::StoreUnavailable { .. } => TokenErrorKind::StoreUnavailable,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            TokenError::Malformed {
                cause: MalformedCause::Empty | MalformedCause::Encoding,
                ..
            } => ErrorCategory::Input,
            TokenError::Malformed { .. } | TokenError::Signing { .. } => {
                ErrorCategory::Cryptographic
            }
            TokenError::Expired => ErrorCategory::Temporal,
            TokenError::Revoked => ErrorCategory::Revocation,
            TokenError::StoreUnavailable { .. } => ErrorCategory::Infrastructure,
        }
    }

    /// Whether the client should be sent back to sign in
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self.kind(),
            TokenErrorKind::Malformed | TokenErrorKind::Expired | TokenErrorKind::Revoked
        )
    }
}

/// Failure of a cache or database round-trip behind one of the store ports
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("{backend} unavailable: {message}")]
    Unavailable {
        backend: &'static str,
        message: String,
    },

    #[error("{backend} did not respond within {after_ms}ms")]
    Timeout { backend: &'static str, after_ms: u64 },
}

impl BackendError {
    pub fn unavailable(backend: &'static str, message: impl Into<String>) -> Self {
        BackendError::Unavailable {
            backend,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::Timeout { .. })
    }
}
