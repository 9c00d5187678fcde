//! Maps token errors onto HTTP responses
//!
//! Every failure reaches the client as the same "Please sign in again"
//! message with a coarse code. The internal kind is only logged.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

use cw_core::errors::{TokenError, TokenErrorKind};
use cw_shared::errors::{error_codes, ErrorResponse};

/// Error type returned by handlers and the auth middleware
#[derive(Debug)]
pub enum ApiError {
    /// No usable `Authorization: Bearer` header
    MissingCredentials,
    /// Body could not be read
    BadRequest(String),
    Token(TokenError),
}

impl From<TokenError> for ApiError {
    fn from(error: TokenError) -> Self {
        ApiError::Token(error)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingCredentials => f.write_str("missing bearer credentials"),
            ApiError::BadRequest(reason) => write!(f, "bad request: {}", reason),
            ApiError::Token(error) => write!(f, "{}", error),
        }
    }
}

impl ApiError {
    fn error_code(&self) -> &'static str {
        match self.status_code() {
            StatusCode::UNAUTHORIZED => error_codes::UNAUTHORIZED,
            StatusCode::BAD_REQUEST => error_codes::BAD_REQUEST,
            StatusCode::SERVICE_UNAVAILABLE => error_codes::SERVICE_UNAVAILABLE,
            _ => error_codes::INTERNAL_ERROR,
        }
    }

    /// Token errors are logged by the lifecycle manager, with the token
    /// fingerprint, before they reach this layer
    fn log_level(&self) -> Option<log::Level> {
        match self {
            ApiError::MissingCredentials | ApiError::BadRequest(_) => Some(log::Level::Debug),
            ApiError::Token(_) => None,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingCredentials => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Token(error) => match error.kind() {
                TokenErrorKind::Malformed | TokenErrorKind::Expired | TokenErrorKind::Revoked => {
                    StatusCode::UNAUTHORIZED
                }
                TokenErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                TokenErrorKind::Signing => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Some(level) = self.log_level() {
            log::log!(level, "Request rejected: {}", self);
        }
        let body = match self {
            ApiError::BadRequest(_) => {
                ErrorResponse::new(self.error_code(), "Invalid request body")
            }
            _ => ErrorResponse::sign_in_again(self.error_code()),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_core::errors::{BackendError, MalformedCause};
    use cw_shared::errors::SIGN_IN_AGAIN;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (TokenError::Expired, StatusCode::UNAUTHORIZED),
            (TokenError::Revoked, StatusCode::UNAUTHORIZED),
            (
                TokenError::malformed(MalformedCause::Signature, "bad signature"),
                StatusCode::UNAUTHORIZED,
            ),
            (
                TokenError::store_unavailable(
                    "authenticate",
                    BackendError::unavailable("mysql", "down"),
                ),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (TokenError::signing("no secret"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status_code(), status);
        }
        assert_eq!(ApiError::MissingCredentials.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_token_errors_are_not_logged_twice() {
        assert_eq!(ApiError::from(TokenError::Revoked).log_level(), None);
        assert_eq!(
            ApiError::from(TokenError::signing("no secret")).log_level(),
            None
        );
        assert_eq!(
            ApiError::MissingCredentials.log_level(),
            Some(log::Level::Debug)
        );
    }

    #[actix_web::test]
    async fn test_body_never_leaks_the_cause() {
        let error = ApiError::from(TokenError::malformed(
            MalformedCause::Algorithm,
            "InvalidAlgorithm",
        ));

        let response = error.error_response();
        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "UNAUTHORIZED");
        assert_eq!(json["message"], SIGN_IN_AGAIN);
        assert!(!String::from_utf8_lossy(&body).contains("Algorithm"));
    }
}
