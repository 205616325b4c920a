//! State and credential consistency across action sequences.

use super::harness::{credentials, registration, session, user, Reply, TestHarness};
use crate::{AuthServiceError, SessionSnapshot, SessionStatus};

fn assert_consistent(snapshot: &SessionSnapshot) {
    let has_credentials = snapshot.user.is_some()
        && snapshot.access_token().is_some_and(|t| !t.is_empty())
        && snapshot.refresh_token().is_some_and(|t| !t.is_empty());

    assert_eq!(
        snapshot.status == SessionStatus::Authenticated,
        has_credentials,
        "authenticated iff user and tokens present: {:?}",
        snapshot
    );
    if snapshot.status == SessionStatus::Anonymous {
        assert!(snapshot.user.is_none());
        assert!(snapshot.session().is_none());
    }
    assert_eq!(
        snapshot.status == SessionStatus::Error,
        snapshot.last_error.is_some(),
        "last_error present only in error: {:?}",
        snapshot
    );
}

#[derive(Debug, Clone, Copy)]
enum Step {
    LoginOk,
    LoginFail,
    RegisterOk,
    RegisterFail,
    Logout,
    RefreshOk,
    RefreshUnauthorized,
    RefreshDown,
    Dismiss,
    Unauthorized,
}

const STEPS: [Step; 10] = [
    Step::LoginOk,
    Step::LoginFail,
    Step::RegisterOk,
    Step::RegisterFail,
    Step::Logout,
    Step::RefreshOk,
    Step::RefreshUnauthorized,
    Step::RefreshDown,
    Step::Dismiss,
    Step::Unauthorized,
];

async fn run(h: &TestHarness, step: Step) {
    match step {
        Step::LoginOk => {
            h.client.queue_login(Reply::Now(Ok(session("u1"))));
            h.store.login(&credentials()).await.unwrap();
        }
        Step::LoginFail => {
            h.client.queue_login(Reply::Now(Err(AuthServiceError::InvalidCredentials(
                "nope".into(),
            ))));
            h.store.login(&credentials()).await.unwrap();
        }
        Step::RegisterOk => {
            h.client.queue_register(Reply::Now(Ok(session("u2"))));
            h.store.register(&registration()).await.unwrap();
        }
        Step::RegisterFail => {
            h.client.queue_register(Reply::Now(Err(AuthServiceError::EmailTaken(
                "taken".into(),
            ))));
            h.store.register(&registration()).await.unwrap();
        }
        Step::Logout => {
            h.store.logout().await.unwrap();
        }
        Step::RefreshOk => {
            h.client.queue_profile(Reply::Now(Ok(user("u1"))));
            h.store.refresh_profile().await.unwrap();
        }
        Step::RefreshUnauthorized => {
            h.client.queue_profile(Reply::Now(Err(AuthServiceError::Unauthorized(
                "expired".into(),
            ))));
            h.store.refresh_profile().await.unwrap();
        }
        Step::RefreshDown => {
            for _ in 0..3 {
                h.client
                    .queue_profile(Reply::Now(Err(AuthServiceError::Server("down".into()))));
            }
            h.store.refresh_profile().await.unwrap();
        }
        Step::Dismiss => {
            h.store.dismiss_error().unwrap();
        }
        Step::Unauthorized => {
            h.store.report_unauthorized().unwrap();
        }
    }
}

/// Persisted storage mirrors the last authenticated or anonymous state.
fn assert_storage_mirrors(h: &TestHarness, last_committed: &Option<String>) {
    let stored = h.persistence.stored().map(|s| s.user.id);
    assert_eq!(&stored, last_committed);
}

#[tokio::test]
async fn every_pair_of_actions_keeps_invariants() {
    for first in STEPS {
        for second in STEPS {
            let h = TestHarness::new();
            let mut committed: Option<String> = None;

            for step in [first, second, Step::LoginOk, first] {
                run(&h, step).await;
                let snapshot = h.store.snapshot();
                assert_consistent(&snapshot);

                match snapshot.status {
                    SessionStatus::Authenticated => {
                        committed = snapshot.user.map(|u| u.id);
                    }
                    SessionStatus::Anonymous => committed = None,
                    // Error keeps whatever was last committed.
                    SessionStatus::Error | SessionStatus::Authenticating => {}
                }
                assert_storage_mirrors(&h, &committed);
            }
        }
    }
}

#[tokio::test]
async fn collaborator_failures_never_escape_as_errors() {
    let h = TestHarness::new();

    // Nothing scripted: every call answers server_error.
    assert!(h.store.login(&credentials()).await.is_ok());
    h.store.dismiss_error().unwrap();
    assert!(h.store.register(&registration()).await.is_ok());
    assert!(h.store.logout().await.is_ok());
    assert_eq!(h.store.status(), SessionStatus::Anonymous);
}
