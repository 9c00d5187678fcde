use actix_web::{web, HttpResponse};

use cw_core::domain::entities::BEARER;

use crate::app::AppState;
use crate::dto::auth::{RefreshTokenRequest, RefreshTokenResponse};
use crate::handlers::error::ApiError;

/// Handler for POST /api/v1/auth/refresh
///
/// The refresh token itself is not rotated; it stays valid until it
/// expires or is revoked.
///
/// # Errors
/// - 401 Unauthorized: refresh token malformed, expired or revoked
/// - 503 Service Unavailable: revocation store unreachable
pub async fn refresh_token(
    state: web::Data<AppState>,
    request: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse, ApiError> {
    let access_token = state
        .tokens
        .refresh(&request.refresh_token, state.deadline())
        .await?;

    let expires_in = state.tokens.access_token_lifetime().num_seconds();

    Ok(HttpResponse::Ok().json(RefreshTokenResponse {
        access_token,
        token_type: BEARER.to_string(),
        expires_in,
    }))
}
