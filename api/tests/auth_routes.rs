//! End-to-end tests for the auth routes, wired to in-memory adapters

use actix_web::{http::StatusCode, test, web, App};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use cw_api::{configure_routes, AppState};
use cw_core::domain::entities::{Role, TokenPair, UserId};
use cw_core::repositories::InMemoryRevocationStore;
use cw_core::services::token::{
    InMemoryRevocationAccelerator, ManualClock, TokenLifecycleManager, TokenServiceConfig,
};
use cw_shared::errors::SIGN_IN_AGAIN;

struct TestContext {
    clock: Arc<ManualClock>,
    store: InMemoryRevocationStore,
    state: web::Data<AppState>,
}

impl TestContext {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        ));
        let accelerator = InMemoryRevocationAccelerator::new(clock.clone());
        let store = InMemoryRevocationStore::new();
        let manager = TokenLifecycleManager::new(
            TokenServiceConfig::default().with_secret("api-test-secret-0123456789abcdef"),
            Arc::new(accelerator),
            Arc::new(store.clone()),
            clock.clone(),
        )
        .unwrap();

        Self {
            clock,
            store,
            state: web::Data::new(AppState::new(Arc::new(manager), Duration::from_secs(2))),
        }
    }

    fn session(&self, id: i64) -> TokenPair {
        self.state
            .tokens
            .issue_session(UserId::new(id).unwrap(), "volunteer@example.org", Role::Volunteer)
            .unwrap()
    }
}

macro_rules! init_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data($ctx.state.clone())
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health_check() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_refresh_returns_access_token() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let pair = ctx.session(42);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .set_json(json!({ "refresh_token": pair.refresh_token }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 900);

    let access = body["access_token"].as_str().unwrap();
    let claims = ctx
        .state
        .tokens
        .authenticate(access, ctx.state.deadline())
        .await
        .unwrap();
    assert_eq!(claims.sub, "42");
}

#[actix_web::test]
async fn test_refresh_rejects_access_token() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let pair = ctx.session(7);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .set_json(json!({ "refresh_token": pair.access_token }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
    assert_eq!(body["message"], SIGN_IN_AGAIN);
}

#[actix_web::test]
async fn test_refresh_with_invalid_body_is_bad_request() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_refresh_fails_closed_when_store_is_down() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let pair = ctx.session(7);
    ctx.store.set_available(false);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .set_json(json!({ "refresh_token": pair.refresh_token }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn test_logout_requires_bearer_token() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_logout_revokes_both_tokens() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let pair = ctx.session(42);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header(("Authorization", format!("Bearer {}", pair.access_token)))
        .set_json(json!({ "refresh_token": pair.refresh_token }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.store.len().await, 2);

    let again = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header(("Authorization", format!("Bearer {}", pair.access_token)))
        .to_request();
    let resp = test::call_service(&app, again).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let refresh = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .set_json(json!({ "refresh_token": pair.refresh_token }))
        .to_request();
    let resp = test::call_service(&app, refresh).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_logout_ignores_foreign_refresh_token() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let mine = ctx.session(1);
    let theirs = ctx.session(2);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header(("Authorization", format!("Bearer {}", mine.access_token)))
        .set_json(json!({ "refresh_token": theirs.refresh_token }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.store.len().await, 1);
    assert!(ctx.store.get(&theirs.refresh_token).await.is_none());
}

#[actix_web::test]
async fn test_expired_access_token_is_rejected() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let pair = ctx.session(42);
    ctx.clock.advance(ChronoDuration::minutes(15));

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header(("Authorization", format!("Bearer {}", pair.access_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(ctx.store.is_empty().await);
}

#[actix_web::test]
async fn test_unknown_route_is_not_found() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/api/v1/nothing").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
