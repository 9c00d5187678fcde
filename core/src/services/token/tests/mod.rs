//! Test suites for the token lifecycle

mod service_tests;

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

use crate::domain::entities::user::UserId;
use crate::errors::{MalformedCause, TokenError};
use crate::repositories::revocation::InMemoryRevocationStore;

use super::{
    InMemoryRevocationAccelerator, ManualClock, TokenLifecycleManager, TokenServiceConfig,
};

pub(super) const SECRET: &str = "lifecycle-test-secret-0123456789";

pub(super) fn start() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

pub(super) fn test_config() -> TokenServiceConfig {
    TokenServiceConfig::default().with_secret(SECRET)
}

pub(super) fn user(id: i64) -> UserId {
    UserId::new(id).unwrap()
}

pub(super) fn malformed_cause(err: TokenError) -> MalformedCause {
    match err {
        TokenError::Malformed { cause, .. } => cause,
        other => panic!("expected a malformed token error, got {other:?}"),
    }
}

/// Manager wired to in-memory adapters, with handles kept for inspection
pub(super) struct Harness {
    pub clock: ManualClock,
    pub accelerator: InMemoryRevocationAccelerator,
    pub store: InMemoryRevocationStore,
    pub manager: TokenLifecycleManager,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: TokenServiceConfig) -> Self {
        let clock = ManualClock::new(start());
        let accelerator = InMemoryRevocationAccelerator::new(Arc::new(clock.clone()));
        let store = InMemoryRevocationStore::new();
        let manager = TokenLifecycleManager::new(
            config,
            Arc::new(accelerator.clone()),
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
        )
        .unwrap();

        Self {
            clock,
            accelerator,
            store,
            manager,
        }
    }
}
