//! Lifecycle tests: issue, authenticate, refresh and revoke

use chrono::Duration;

use super::{malformed_cause, start, user, Harness};
use crate::domain::entities::revocation::RevocationReason;
use crate::domain::entities::token::BEARER;
use crate::domain::entities::user::Role;
use crate::errors::{MalformedCause, TokenError, TokenErrorKind};
use crate::services::token::{AcceleratorVerdict, Deadline, RevocationAccelerator};

#[tokio::test]
async fn test_authenticate_round_trip_for_every_role() {
    let h = Harness::new();

    for (id, role) in [
        (1, Role::Visitor),
        (2, Role::Volunteer),
        (3, Role::Donor),
        (4, Role::Admin),
    ] {
        let email = format!("user{id}@charity.org");
        let pair = h.manager.issue_session(user(id), &email, role).unwrap();

        let claims = h
            .manager
            .authenticate(&pair.access_token, Deadline::none())
            .await
            .unwrap();

        assert_eq!(claims.user_id(), Some(user(id)));
        assert_eq!(claims.email, email);
        assert_eq!(claims.role, role);
    }
}

#[tokio::test]
async fn test_session_issued_mid_second_lasts_full_ttl() {
    let h = Harness::new();
    h.clock.advance(Duration::milliseconds(700));
    let pair = h
        .manager
        .issue_session(user(7), "a@b.org", Role::Volunteer)
        .unwrap();

    h.clock.advance(Duration::milliseconds(899_500));
    assert!(h
        .manager
        .authenticate(&pair.access_token, Deadline::none())
        .await
        .is_ok());

    h.clock.advance(Duration::milliseconds(500));
    assert_eq!(
        h.manager
            .authenticate(&pair.access_token, Deadline::none())
            .await
            .unwrap_err(),
        TokenError::Expired
    );
}

#[test]
fn test_issue_session_reports_lifetimes() {
    let h = Harness::new();

    let pair = h.manager.issue_session(user(9), "a@b.org", Role::Donor).unwrap();

    assert_eq!(pair.token_type, BEARER);
    assert_eq!(pair.access_expires_in, 900);
    assert_eq!(pair.refresh_expires_in, 604_800);
    assert_ne!(pair.access_token, pair.refresh_token);
}

#[tokio::test]
async fn test_session_scenario() {
    let h = Harness::new();
    let pair = h
        .manager
        .issue_session(user(7), "a@b.org", Role::Volunteer)
        .unwrap();

    let claims = h
        .manager
        .authenticate(&pair.access_token, Deadline::none())
        .await
        .unwrap();
    assert_eq!(claims.user_id(), Some(user(7)));
    assert_eq!(claims.email, "a@b.org");
    assert_eq!(claims.role, Role::Volunteer);

    h.clock
        .advance(Duration::seconds(900) + Duration::nanoseconds(1));
    assert_eq!(
        h.manager
            .authenticate(&pair.access_token, Deadline::none())
            .await
            .unwrap_err(),
        TokenError::Expired
    );

    h.manager
        .revoke(&pair.refresh_token, user(7), RevocationReason::Logout, Deadline::none())
        .await
        .unwrap();
    assert_eq!(
        h.manager
            .refresh(&pair.refresh_token, Deadline::none())
            .await
            .unwrap_err(),
        TokenError::Revoked
    );
}

#[tokio::test]
async fn test_valid_strictly_before_expiry() {
    let h = Harness::new();
    let pair = h.manager.issue_session(user(7), "a@b.org", Role::Volunteer).unwrap();

    h.clock
        .advance(Duration::seconds(899) + Duration::nanoseconds(999_999_999));

    assert!(h
        .manager
        .authenticate(&pair.access_token, Deadline::none())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_refresh_keeps_identity() {
    let h = Harness::new();
    let pair = h.manager.issue_session(user(11), "vol@charity.org", Role::Volunteer).unwrap();
    h.clock.advance(Duration::minutes(20));

    let access = h.manager.refresh(&pair.refresh_token, Deadline::none()).await.unwrap();
    let claims = h.manager.authenticate(&access, Deadline::none()).await.unwrap();

    assert_eq!(claims.user_id(), Some(user(11)));
    assert_eq!(claims.email, "vol@charity.org");
    assert_eq!(claims.role, Role::Volunteer);
    assert_eq!(claims.iat, start() + Duration::minutes(20));
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let h = Harness::new();
    let pair = h.manager.issue_session(user(1), "a@b.org", Role::Visitor).unwrap();

    let err = h.manager.refresh(&pair.access_token, Deadline::none()).await.unwrap_err();

    assert_eq!(malformed_cause(err), MalformedCause::WrongKind);
}

#[tokio::test]
async fn test_authenticate_rejects_refresh_token() {
    let h = Harness::new();
    let pair = h.manager.issue_session(user(1), "a@b.org", Role::Visitor).unwrap();

    let err = h
        .manager
        .authenticate(&pair.refresh_token, Deadline::none())
        .await
        .unwrap_err();

    assert_eq!(malformed_cause(err), MalformedCause::WrongKind);
}

#[tokio::test]
async fn test_refresh_token_expires() {
    let h = Harness::new();
    let pair = h.manager.issue_session(user(1), "a@b.org", Role::Visitor).unwrap();

    h.clock.advance(Duration::days(7));

    assert_eq!(
        h.manager.refresh(&pair.refresh_token, Deadline::none()).await.unwrap_err(),
        TokenError::Expired
    );
}

#[tokio::test]
async fn test_revoked_access_token_is_rejected() {
    let h = Harness::new();
    let pair = h.manager.issue_session(user(2), "a@b.org", Role::Donor).unwrap();

    h.manager
        .revoke(&pair.access_token, user(2), RevocationReason::Logout, Deadline::none())
        .await
        .unwrap();

    let err = h
        .manager
        .authenticate(&pair.access_token, Deadline::none())
        .await
        .unwrap_err();
    assert_eq!(err, TokenError::Revoked);
    assert_eq!(err.kind(), TokenErrorKind::Revoked);
}

#[tokio::test]
async fn test_revocation_survives_accelerator_wipe() {
    let h = Harness::new();
    let pair = h.manager.issue_session(user(2), "a@b.org", Role::Donor).unwrap();
    h.manager
        .revoke(&pair.access_token, user(2), RevocationReason::Logout, Deadline::none())
        .await
        .unwrap();

    h.accelerator.wipe().await;

    assert_eq!(
        h.manager
            .authenticate(&pair.access_token, Deadline::none())
            .await
            .unwrap_err(),
        TokenError::Revoked
    );
}

#[tokio::test]
async fn test_revocation_survives_accelerator_outage() {
    let h = Harness::new();
    let pair = h.manager.issue_session(user(2), "a@b.org", Role::Donor).unwrap();
    h.manager
        .revoke(&pair.access_token, user(2), RevocationReason::Logout, Deadline::none())
        .await
        .unwrap();

    h.accelerator.set_available(false);

    assert_eq!(
        h.manager
            .authenticate(&pair.access_token, Deadline::none())
            .await
            .unwrap_err(),
        TokenError::Revoked
    );
}

#[tokio::test]
async fn test_wiped_accelerator_is_repaired_on_lookup() {
    let h = Harness::new();
    let pair = h.manager.issue_session(user(2), "a@b.org", Role::Donor).unwrap();
    h.manager
        .revoke(&pair.access_token, user(2), RevocationReason::Logout, Deadline::none())
        .await
        .unwrap();
    h.accelerator.wipe().await;

    let _ = h.manager.authenticate(&pair.access_token, Deadline::none()).await;

    assert_eq!(
        h.accelerator.is_revoked(&pair.access_token).await.unwrap(),
        AcceleratorVerdict::Revoked
    );
}

#[tokio::test]
async fn test_revoke_succeeds_while_accelerator_is_down() {
    let h = Harness::new();
    let pair = h.manager.issue_session(user(3), "a@b.org", Role::Donor).unwrap();
    h.accelerator.set_available(false);

    h.manager
        .revoke(&pair.access_token, user(3), RevocationReason::Logout, Deadline::none())
        .await
        .unwrap();

    assert!(h.store.get(&pair.access_token).await.is_some());
    h.accelerator.set_available(true);
    assert!(h.accelerator.is_empty().await);
}

#[tokio::test]
async fn test_revoke_is_idempotent() {
    let h = Harness::new();
    let pair = h.manager.issue_session(user(4), "a@b.org", Role::Admin).unwrap();

    for reason in [RevocationReason::Logout, RevocationReason::Compromised] {
        h.manager
            .revoke(&pair.access_token, user(4), reason, Deadline::none())
            .await
            .unwrap();
    }

    assert_eq!(h.store.len().await, 1);
    assert_eq!(
        h.store.get(&pair.access_token).await.unwrap().reason,
        RevocationReason::Logout
    );
    assert_eq!(
        h.manager
            .authenticate(&pair.access_token, Deadline::none())
            .await
            .unwrap_err(),
        TokenError::Revoked
    );
}

#[tokio::test]
async fn test_revoke_fails_when_store_write_fails() {
    let h = Harness::new();
    let pair = h.manager.issue_session(user(5), "a@b.org", Role::Visitor).unwrap();
    h.store.set_available(false);

    let err = h
        .manager
        .revoke(&pair.access_token, user(5), RevocationReason::Logout, Deadline::none())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), TokenErrorKind::StoreUnavailable);
    // The mirror write went through but does not make the revoke succeed
    assert_eq!(
        h.accelerator.is_revoked(&pair.access_token).await.unwrap(),
        AcceleratorVerdict::Revoked
    );
}

#[tokio::test]
async fn test_mirror_ttl_matches_remaining_validity() {
    let h = Harness::new();
    let pair = h.manager.issue_session(user(6), "a@b.org", Role::Visitor).unwrap();
    h.clock.advance(Duration::seconds(100));

    h.manager
        .revoke(&pair.access_token, user(6), RevocationReason::Logout, Deadline::none())
        .await
        .unwrap();

    let record = h.store.get(&pair.access_token).await.unwrap();
    assert_eq!(record.expires_at, start() + Duration::seconds(900));
    assert_eq!(record.blacklisted_at, start() + Duration::seconds(100));

    h.clock.advance(Duration::seconds(799));
    assert_eq!(
        h.accelerator.is_revoked(&pair.access_token).await.unwrap(),
        AcceleratorVerdict::Revoked
    );
    h.clock.advance(Duration::seconds(1));
    assert_eq!(
        h.accelerator.is_revoked(&pair.access_token).await.unwrap(),
        AcceleratorVerdict::NotRevoked
    );
}

#[tokio::test]
async fn test_revoke_expired_token_skips_mirror() {
    let h = Harness::new();
    let pair = h.manager.issue_session(user(6), "a@b.org", Role::Visitor).unwrap();
    h.clock.advance(Duration::hours(1));

    h.manager
        .revoke(&pair.access_token, user(6), RevocationReason::Logout, Deadline::none())
        .await
        .unwrap();

    assert!(h.accelerator.is_empty().await);
    assert!(h.store.get(&pair.access_token).await.is_some());
}

#[tokio::test]
async fn test_revoke_unreadable_token_uses_fallback_ttl() {
    let h = Harness::new();

    h.manager
        .revoke("not-a-token", user(8), RevocationReason::Compromised, Deadline::none())
        .await
        .unwrap();

    let record = h.store.get("not-a-token").await.unwrap();
    assert_eq!(record.expires_at, start() + Duration::days(7));
    assert_eq!(record.user_id, user(8));
    assert_eq!(
        h.accelerator.is_revoked("not-a-token").await.unwrap(),
        AcceleratorVerdict::Revoked
    );
}

#[tokio::test]
async fn test_revoke_rejects_empty_token() {
    let h = Harness::new();

    let err = h
        .manager
        .revoke("", user(1), RevocationReason::Logout, Deadline::none())
        .await
        .unwrap_err();

    assert_eq!(malformed_cause(err), MalformedCause::Empty);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_revoking_one_token_leaves_others_valid() {
    let h = Harness::new();
    let first = h.manager.issue_session(user(1), "a@b.org", Role::Visitor).unwrap();
    let second = h.manager.issue_session(user(1), "a@b.org", Role::Visitor).unwrap();

    h.manager
        .revoke(&first.access_token, user(1), RevocationReason::Logout, Deadline::none())
        .await
        .unwrap();

    assert!(h
        .manager
        .authenticate(&second.access_token, Deadline::none())
        .await
        .is_ok());
    assert!(h.manager.refresh(&first.refresh_token, Deadline::none()).await.is_ok());
}

#[test]
fn test_refresh_token_ownership() {
    let h = Harness::new();
    let mine = h.manager.issue_session(user(1), "a@b.org", Role::Donor).unwrap();
    let theirs = h.manager.issue_session(user(2), "c@d.org", Role::Donor).unwrap();

    assert_eq!(h.manager.owns_refresh_token(&mine.refresh_token, user(1)), Ok(true));
    assert_eq!(h.manager.owns_refresh_token(&theirs.refresh_token, user(1)), Ok(false));
    assert_eq!(
        malformed_cause(
            h.manager
                .owns_refresh_token(&mine.access_token, user(1))
                .unwrap_err()
        ),
        MalformedCause::WrongKind
    );
    assert_eq!(h.manager.access_token_lifetime(), Duration::minutes(15));
}
