//! Application state and route wiring
//!
//! `main` builds one [`AppState`] at startup; the same state is handed to
//! every worker and to the integration tests.

use actix_web::{web, HttpResponse};
use std::sync::Arc;
use std::time::Duration;

use cw_core::services::token::{Deadline, TokenLifecycleManager};

use crate::handlers::error::ApiError;
use crate::routes;

/// Shared state for all handlers
pub struct AppState {
    pub tokens: Arc<TokenLifecycleManager>,
    /// Budget for the revocation I/O of one request
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(tokens: Arc<TokenLifecycleManager>, request_timeout: Duration) -> Self {
        Self {
            tokens,
            request_timeout,
        }
    }

    /// Deadline for the request currently being served
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.request_timeout)
    }
}

/// Registers every route; used by `main` and by the tests
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .route("/health", web::get().to(health_check))
    .service(web::scope("/api/v1/auth").configure(routes::auth::configure))
    .default_service(web::to(not_found));
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "charityworks-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(cw_shared::errors::ErrorResponse::new(
        cw_shared::errors::error_codes::NOT_FOUND,
        "Resource not found",
    ))
}
