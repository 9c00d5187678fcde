//! Session token endpoints
//!
//! - `POST /refresh` mints a new access token from a refresh token
//! - `POST /logout` revokes the caller's tokens

pub mod logout;
pub mod refresh;

use actix_web::web;

use crate::middleware::JwtAuth;

/// Mounts the auth endpoints under the current scope
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/refresh", web::post().to(refresh::refresh_token))
        .service(
            web::resource("/logout")
                .wrap(JwtAuth::new())
                .route(web::post().to(logout::logout)),
        );
}
