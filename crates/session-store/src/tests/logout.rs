//! Explicit sign-out.

use super::harness::{credentials, session, Reply, TestHarness};
use crate::{ActionOutcome, AuthServiceError, SessionStatus};

#[tokio::test]
async fn login_then_logout_round_trip() {
    let h = TestHarness::new();
    h.sign_in("u1").await;
    assert_eq!(h.persistence.stored(), Some(session("u1")));

    let outcome = h.store.logout().await.unwrap();

    let ActionOutcome::Committed(snapshot) = outcome else {
        panic!("expected committed outcome, got {:?}", outcome);
    };
    assert_eq!(snapshot.status, SessionStatus::Anonymous);
    assert!(snapshot.user.is_none());
    assert!(snapshot.session().is_none());
    assert!(h.persistence.stored().is_none());
    assert!(h.store.access_token().is_none());
    assert_eq!(h.client.logout_tokens(), vec!["access-u1".to_string()]);
}

#[tokio::test]
async fn remote_failure_still_signs_out() {
    let h = TestHarness::new();
    h.sign_in("u1").await;
    h.client
        .queue_logout(Err(AuthServiceError::Network("offline".into())));

    let outcome = h.store.logout().await.unwrap();

    assert!(outcome.is_committed());
    assert_eq!(h.store.status(), SessionStatus::Anonymous);
    assert!(h.persistence.stored().is_none());
    assert_eq!(h.client.logout_calls(), 1);
}

#[tokio::test]
async fn storage_is_cleared_before_the_remote_call() {
    let h = TestHarness::new();
    h.sign_in("u1").await;

    let store = h.store.clone();
    let persistence = h.persistence.clone();
    let task = tokio::spawn(async move { store.logout().await });
    h.wait_for(1, |c| c.logout_calls()).await;

    assert!(persistence.stored().is_none());
    assert_eq!(h.store.status(), SessionStatus::Anonymous);
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn logout_when_anonymous_skips_the_remote_call() {
    let h = TestHarness::new();

    let outcome = h.store.logout().await.unwrap();

    assert!(outcome.is_committed());
    assert_eq!(h.store.status(), SessionStatus::Anonymous);
    assert_eq!(h.client.logout_calls(), 0);
    assert_eq!(h.persistence.clears(), 1);
}

#[tokio::test]
async fn logout_clears_a_failed_attempt() {
    let h = TestHarness::new();
    h.client.queue_login(Reply::Now(Err(AuthServiceError::InvalidCredentials(
        "nope".into(),
    ))));
    h.store.login(&credentials()).await.unwrap();
    assert_eq!(h.store.status(), SessionStatus::Error);

    h.store.logout().await.unwrap();

    let snapshot = h.store.snapshot();
    assert_eq!(snapshot.status, SessionStatus::Anonymous);
    assert!(snapshot.last_error.is_none());
}

#[tokio::test]
async fn clear_failure_does_not_block_logout() {
    let h = TestHarness::new();
    h.sign_in("u1").await;
    h.persistence.fail_clears(true);

    h.store.logout().await.unwrap();

    assert_eq!(h.store.status(), SessionStatus::Anonymous);
    assert!(h.store.snapshot().user.is_none());
}
