//! Bearer token middleware for protected endpoints.
//!
//! Pulls the access token from the `Authorization` header, runs it through
//! the lifecycle manager (signature, expiry and revocation) and injects an
//! [`AuthContext`] into the request extensions.

use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use chrono::{DateTime, Utc};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    task::{Context, Poll},
};

use cw_core::{
    domain::entities::{Claims, Role, UserId},
    errors::{MalformedCause, TokenError},
};

use crate::app::AppState;
use crate::handlers::error::ApiError;

/// Authenticated caller, available to handlers behind [`JwtAuth`]
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    /// The raw access token, kept so logout can revoke it
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthContext {
    pub fn from_claims(claims: Claims, token: String) -> Result<Self, TokenError> {
        let user_id = claims.user_id().ok_or_else(|| {
            TokenError::malformed(MalformedCause::InvalidClaims, "subject is not a user id")
        })?;

        Ok(Self {
            user_id,
            expires_at: claims.exp,
            email: claims.email,
            role: claims.role,
            token,
        })
    }
}

/// Middleware factory requiring a valid, unrevoked access token
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtAuth;

impl JwtAuth {
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let token = extract_bearer_token(req.headers()).ok_or(ApiError::MissingCredentials)?;

            let state = req
                .app_data::<web::Data<AppState>>()
                .cloned()
                .ok_or_else(|| {
                    ApiError::Token(TokenError::signing("token manager is not configured"))
                })?;

            let claims = state
                .tokens
                .authenticate(&token, state.deadline())
                .await
                .map_err(ApiError::from)?;
            let context = AuthContext::from_claims(claims, token).map_err(ApiError::from)?;

            log::debug!("Authenticated user {} ({})", context.user_id, context.role);
            req.extensions_mut().insert(context);

            service.call(req).await
        })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
}

impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ApiError::MissingCredentials.into());

        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_extract_bearer_token() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer test_token_123"))
            .to_srv_request();
        assert_eq!(
            extract_bearer_token(req.headers()),
            Some("test_token_123".to_string())
        );

        let req_no_bearer = TestRequest::default()
            .insert_header((AUTHORIZATION, "test_token_123"))
            .to_srv_request();
        assert_eq!(extract_bearer_token(req_no_bearer.headers()), None);

        let req_empty = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer "))
            .to_srv_request();
        assert_eq!(extract_bearer_token(req_empty.headers()), None);

        let req_no_header = TestRequest::default().to_srv_request();
        assert_eq!(extract_bearer_token(req_no_header.headers()), None);
    }
}
