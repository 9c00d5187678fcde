use actix_web::{web, HttpResponse};

use cw_core::domain::entities::RevocationReason;

use crate::app::AppState;
use crate::dto::auth::{LogoutRequest, LogoutResponse};
use crate::handlers::error::ApiError;
use crate::middleware::AuthContext;

/// Handler for POST /api/v1/auth/logout
///
/// Revokes the bearer access token. When the body carries the session's
/// refresh token it is revoked too, provided it belongs to the same user.
///
/// # Errors
/// - 401 Unauthorized: missing, invalid or revoked access token
/// - 503 Service Unavailable: the revocation could not be persisted
pub async fn logout(
    state: web::Data<AppState>,
    auth: AuthContext,
    body: Option<web::Json<LogoutRequest>>,
) -> Result<HttpResponse, ApiError> {
    let deadline = state.deadline();

    state
        .tokens
        .revoke(&auth.token, auth.user_id, RevocationReason::Logout, deadline)
        .await?;

    if let Some(refresh_token) = body.and_then(|body| body.into_inner().refresh_token) {
        match state.tokens.owns_refresh_token(&refresh_token, auth.user_id) {
            Ok(true) => {
                state
                    .tokens
                    .revoke(&refresh_token, auth.user_id, RevocationReason::Logout, deadline)
                    .await?;
            }
            Ok(false) => log::warn!(
                "User {} tried to revoke a refresh token issued to someone else",
                auth.user_id
            ),
            Err(e) => log::debug!("Ignoring unusable refresh token on logout: {}", e),
        }
    }

    log::info!("User {} logged out", auth.user_id);

    Ok(HttpResponse::Ok().json(LogoutResponse {
        message: "Logged out successfully".to_string(),
    }))
}
