//! The session store: single owner of the client-side auth session.
//!
//! All state lives behind one `std::sync::Mutex`. The lock is never held
//! across an `.await`; every network call snapshots what it needs, releases
//! the lock, and re-checks the epoch before committing its result.

use crate::auth_fsm::{RetryConfig, SessionMachine, SessionMachineInput, SessionStatus};
use crate::client::AuthServiceClient;
use crate::error::{AuthServiceError, ClassifiedError, ErrorKind, StoreError, StoreResult};
use crate::models::{AuthSession, Credentials, Registration, SessionSnapshot, User};
use crate::persistence::SessionPersistence;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Store tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Buffered events per subscriber before slow receivers start lagging.
    pub event_capacity: usize,
    /// Retry behavior for transient profile refresh failures.
    pub retry: RetryConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            event_capacity: 64,
            retry: RetryConfig::default(),
        }
    }
}

/// What an action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action ran to completion and its result was committed.
    Committed(SessionSnapshot),
    /// A login or registration is already pending; nothing was sent.
    AlreadyInFlight,
    /// The action does not apply in the current state; nothing was sent.
    NotApplicable,
    /// The response arrived after a newer transition and was discarded.
    Superseded,
    /// Profile refresh failed; the previous user record is kept.
    ProfileStale(ClassifiedError),
}

impl ActionOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, ActionOutcome::Committed(_))
    }
}

/// Notifications published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The snapshot changed.
    StateChanged(SessionSnapshot),
    /// A profile refresh failed without affecting the session.
    ProfileRefreshFailed(ClassifiedError),
    /// Local storage could not be read, written or cleared.
    PersistenceFailed(ClassifiedError),
}

struct Inner {
    machine: SessionMachine,
    session: Option<AuthSession>,
    last_error: Option<ClassifiedError>,
    /// Bumped by every transition that invalidates in-flight responses.
    epoch: u64,
    hydrated: bool,
}

impl Inner {
    fn new() -> Self {
        Self {
            machine: SessionMachine::new(),
            session: None,
            last_error: None,
            epoch: 0,
            hydrated: false,
        }
    }

    fn status(&self) -> SessionStatus {
        SessionStatus::from(self.machine.state())
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status(),
            user: self.session.as_ref().map(|s| s.user.clone()),
            last_error: self.last_error.clone(),
            session: self.session.clone(),
        }
    }

    fn is_consistent(&self) -> bool {
        match self.status() {
            SessionStatus::Authenticated => {
                self.session.as_ref().is_some_and(AuthSession::is_complete)
                    && self.last_error.is_none()
            }
            SessionStatus::Error => self.session.is_none() && self.last_error.is_some(),
            SessionStatus::Anonymous | SessionStatus::Authenticating => {
                self.session.is_none() && self.last_error.is_none()
            }
        }
    }
}

enum Attempt {
    Started { epoch: u64 },
    Rejected(ActionOutcome),
}

/// Client-side session store.
///
/// Holds the authenticated user and tokens, drives the auth service, mirrors
/// every committed authenticated or anonymous state into persistence, and
/// publishes [`SessionEvent`]s. Collaborator failures are committed to state
/// and never returned as `Err`.
pub struct SessionStore {
    client: Arc<dyn AuthServiceClient>,
    persistence: Arc<dyn SessionPersistence>,
    inner: Mutex<Inner>,
    events: broadcast::Sender<SessionEvent>,
    config: StoreConfig,
}

impl SessionStore {
    /// Create an anonymous, not yet hydrated store.
    pub fn new(
        client: Arc<dyn AuthServiceClient>,
        persistence: Arc<dyn SessionPersistence>,
        config: StoreConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            client,
            persistence,
            inner: Mutex::new(Inner::new()),
            events,
            config,
        }
    }

    /// Create a store and hydrate it from persistence.
    pub fn open(
        client: Arc<dyn AuthServiceClient>,
        persistence: Arc<dyn SessionPersistence>,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        let store = Self::new(client, persistence, config);
        store.hydrate()?;
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status()
    }

    /// Bearer token for authenticated requests, if signed in.
    pub fn access_token(&self) -> Option<String> {
        let inner = self.lock();
        match inner.status() {
            SessionStatus::Authenticated => inner.session.as_ref().map(|s| s.access_token.clone()),
            _ => None,
        }
    }

    pub fn is_hydrated(&self) -> bool {
        self.lock().hydrated
    }

    /// Initialize from persisted storage. Runs once; later calls return the
    /// current snapshot.
    ///
    /// A complete record yields `authenticated` without a network call. A
    /// restore during a pending attempt wins and the attempt's response is
    /// discarded.
    pub fn hydrate(&self) -> StoreResult<SessionSnapshot> {
        let mut inner = self.lock();
        if inner.hydrated {
            return Ok(inner.snapshot());
        }
        inner.hydrated = true;

        if inner.status().is_authenticated() {
            debug!("Session already established, skipping hydrate");
            return Ok(inner.snapshot());
        }

        match self.persistence.read() {
            Ok(Some(session)) if session.is_complete() => {
                let before = inner.snapshot();
                self.transition(&mut inner, &SessionMachineInput::SessionRestored)?;
                info!(user_id = %session.user.id, "Restored persisted session");
                inner.session = Some(session);
                inner.last_error = None;
                inner.epoch += 1;
                self.publish_if_changed(&inner, &before);
            }
            Ok(Some(_)) => {
                warn!("Discarding incomplete persisted session");
                self.clear_persisted();
            }
            Ok(None) => debug!("No persisted session"),
            Err(e) => {
                warn!(error = %e, "Could not read persisted session");
                self.publish(SessionEvent::PersistenceFailed(ClassifiedError::new(
                    ErrorKind::StorageError,
                    e.to_string(),
                )));
            }
        }

        Ok(inner.snapshot())
    }

    /// Sign in with email and password.
    pub async fn login(&self, credentials: &Credentials) -> StoreResult<ActionOutcome> {
        credentials.validate()?;

        let epoch = match self.begin_attempt(SessionMachineInput::LoginAttempt)? {
            Attempt::Started { epoch } => epoch,
            Attempt::Rejected(outcome) => return Ok(outcome),
        };

        debug!(epoch, "Login started");
        let result = self.client.login(credentials).await;
        self.finish_attempt(epoch, result)
    }

    /// Create an account and sign in.
    pub async fn register(&self, registration: &Registration) -> StoreResult<ActionOutcome> {
        registration.validate()?;

        let epoch = match self.begin_attempt(SessionMachineInput::RegisterAttempt)? {
            Attempt::Started { epoch } => epoch,
            Attempt::Rejected(outcome) => return Ok(outcome),
        };

        debug!(epoch, "Registration started");
        let result = self.client.register(registration).await;
        self.finish_attempt(epoch, result)
    }

    /// Sign out. Local state and storage are cleared before the remote call,
    /// whose failure is only logged.
    pub async fn logout(&self) -> StoreResult<ActionOutcome> {
        let (access_token, snapshot) = {
            let mut inner = self.lock();
            let before = inner.snapshot();
            self.transition(&mut inner, &SessionMachineInput::LogoutRequested)?;
            let access_token = inner.session.take().map(|s| s.access_token);
            inner.last_error = None;
            inner.epoch += 1;
            self.clear_persisted();
            info!(epoch = inner.epoch, "Signed out locally");
            (access_token, self.publish_if_changed(&inner, &before))
        };

        if let Some(token) = access_token {
            match self.client.logout(&token).await {
                Ok(()) => debug!("Remote sign-out completed"),
                Err(e) => warn!(kind = e.kind().as_str(), error = %e, "Remote sign-out failed"),
            }
        }

        Ok(ActionOutcome::Committed(snapshot))
    }

    /// Re-fetch the user record. Only valid while authenticated.
    ///
    /// `unauthorized` signs out locally. Transient failures are retried per
    /// [`RetryConfig`]; any other failure keeps the stale user and returns
    /// [`ActionOutcome::ProfileStale`].
    pub async fn refresh_profile(&self) -> StoreResult<ActionOutcome> {
        let (epoch, access_token, user_id) = {
            let inner = self.lock();
            match (inner.status(), inner.session.as_ref()) {
                (SessionStatus::Authenticated, Some(session)) => (
                    inner.epoch,
                    session.access_token.clone(),
                    session.user.id.clone(),
                ),
                _ => return Ok(ActionOutcome::NotApplicable),
            }
        };

        let attempts = self.config.retry.attempts();
        let mut attempt = 0;
        let result = loop {
            match self.client.refresh_profile(&access_token).await {
                Err(e) if e.is_transient() && attempt + 1 < attempts => {
                    let delay = self.config.retry.delay_for_attempt(attempt);
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        kind = e.kind().as_str(),
                        "Profile refresh failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    if !self.is_current(epoch) {
                        debug!(epoch, "Session changed during profile refresh backoff");
                        return Ok(ActionOutcome::Superseded);
                    }
                    attempt += 1;
                }
                other => break other,
            }
        };

        let mut inner = self.lock();
        if inner.epoch != epoch || !inner.status().is_authenticated() {
            debug!(epoch, current = inner.epoch, "Discarding superseded profile response");
            return Ok(ActionOutcome::Superseded);
        }

        let result = result.and_then(|user| checked_profile(user, &user_id));

        match result {
            Ok(user) => {
                let before = inner.snapshot();
                self.transition(&mut inner, &SessionMachineInput::ProfileRefreshed)?;
                if let Some(session) = inner.session.as_mut() {
                    session.user = user;
                }
                self.write_persisted(&inner);
                debug!("Profile refreshed");
                Ok(ActionOutcome::Committed(self.publish_if_changed(&inner, &before)))
            }
            Err(AuthServiceError::Unauthorized(message)) => {
                info!(message = %message, "Profile refresh rejected, signing out");
                self.invalidate(&mut inner)?;
                Ok(ActionOutcome::Committed(inner.snapshot()))
            }
            Err(e) => {
                self.transition(&mut inner, &SessionMachineInput::ProfileRefreshFailed)?;
                let error = e.classify();
                warn!(
                    kind = error.kind.as_str(),
                    attempt = attempt + 1,
                    "Profile refresh failed, keeping cached user"
                );
                self.publish(SessionEvent::ProfileRefreshFailed(error.clone()));
                Ok(ActionOutcome::ProfileStale(error))
            }
        }
    }

    /// Sign out locally after an authenticated request was rejected with 401.
    pub fn report_unauthorized(&self) -> StoreResult<ActionOutcome> {
        let mut inner = self.lock();
        if !inner.status().is_authenticated() {
            return Ok(ActionOutcome::NotApplicable);
        }
        info!("Access token rejected, signing out");
        self.invalidate(&mut inner)?;
        Ok(ActionOutcome::Committed(inner.snapshot()))
    }

    /// Acknowledge a failed login or registration and return to anonymous.
    pub fn dismiss_error(&self) -> StoreResult<ActionOutcome> {
        let mut inner = self.lock();
        if inner.status() != SessionStatus::Error {
            return Ok(ActionOutcome::NotApplicable);
        }
        let before = inner.snapshot();
        self.transition(&mut inner, &SessionMachineInput::ErrorDismissed)?;
        inner.last_error = None;
        Ok(ActionOutcome::Committed(self.publish_if_changed(&inner, &before)))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.lock().epoch == epoch
    }

    /// Consume an FSM input, logging the change.
    fn transition(&self, inner: &mut Inner, input: &SessionMachineInput) -> StoreResult<()> {
        let old_status = inner.status();
        inner.machine.consume(input).map_err(|_| {
            StoreError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {}",
                input, old_status
            ))
        })?;

        let new_status = inner.status();
        if old_status != new_status {
            debug!(
                old_status = old_status.as_str(),
                new_status = new_status.as_str(),
                "Session state transition"
            );
        }
        Ok(())
    }

    fn begin_attempt(&self, input: SessionMachineInput) -> StoreResult<Attempt> {
        let mut inner = self.lock();
        match inner.status() {
            SessionStatus::Authenticating => {
                debug!(status = "authenticating", "Auth attempt already in flight");
                return Ok(Attempt::Rejected(ActionOutcome::AlreadyInFlight));
            }
            SessionStatus::Authenticated => {
                debug!(status = "authenticated", "Already signed in");
                return Ok(Attempt::Rejected(ActionOutcome::NotApplicable));
            }
            SessionStatus::Anonymous | SessionStatus::Error => {}
        }

        let before = inner.snapshot();
        self.transition(&mut inner, &input)?;
        inner.last_error = None;
        inner.epoch += 1;
        self.publish_if_changed(&inner, &before);
        Ok(Attempt::Started { epoch: inner.epoch })
    }

    fn finish_attempt(
        &self,
        epoch: u64,
        result: Result<AuthSession, AuthServiceError>,
    ) -> StoreResult<ActionOutcome> {
        let mut inner = self.lock();
        if inner.epoch != epoch || inner.status() != SessionStatus::Authenticating {
            debug!(epoch, current = inner.epoch, "Discarding superseded auth response");
            return Ok(ActionOutcome::Superseded);
        }

        let result = result.and_then(|session| {
            if session.is_complete() {
                Ok(session)
            } else {
                Err(AuthServiceError::Server(
                    "auth service returned an incomplete session".to_string(),
                ))
            }
        });

        let before = inner.snapshot();
        match result {
            Ok(session) => {
                self.transition(&mut inner, &SessionMachineInput::AttemptSucceeded)?;
                info!(user_id = %session.user.id, "Signed in");
                inner.session = Some(session);
                inner.last_error = None;
                self.write_persisted(&inner);
            }
            Err(e) => {
                self.transition(&mut inner, &SessionMachineInput::AttemptFailed)?;
                let error = e.classify();
                warn!(kind = error.kind.as_str(), "Auth attempt failed");
                inner.last_error = Some(error);
            }
        }

        Ok(ActionOutcome::Committed(self.publish_if_changed(&inner, &before)))
    }

    /// Drop the session after the server rejected its token.
    fn invalidate(&self, inner: &mut Inner) -> StoreResult<()> {
        let before = inner.snapshot();
        self.transition(inner, &SessionMachineInput::SessionRejected)?;
        inner.session = None;
        inner.last_error = None;
        inner.epoch += 1;
        self.clear_persisted();
        self.publish_if_changed(inner, &before);
        Ok(())
    }

    /// Mirror the committed session into storage. Failures never change state.
    fn write_persisted(&self, inner: &Inner) {
        let Some(session) = inner.session.as_ref() else {
            return;
        };
        if let Err(e) = self.persistence.write(session) {
            warn!(error = %e, "Could not persist session");
            self.publish(SessionEvent::PersistenceFailed(ClassifiedError::new(
                ErrorKind::StorageError,
                e.to_string(),
            )));
        }
    }

    fn clear_persisted(&self) {
        if let Err(e) = self.persistence.clear() {
            warn!(error = %e, "Could not clear persisted session");
            self.publish(SessionEvent::PersistenceFailed(ClassifiedError::new(
                ErrorKind::StorageError,
                e.to_string(),
            )));
        }
    }

    /// Publish `StateChanged` if the snapshot differs from `before`.
    fn publish_if_changed(&self, inner: &Inner, before: &SessionSnapshot) -> SessionSnapshot {
        debug_assert!(inner.is_consistent(), "session invariants violated");
        let snapshot = inner.snapshot();
        if snapshot != *before {
            self.publish(SessionEvent::StateChanged(snapshot.clone()));
        }
        snapshot
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

/// Reject a profile that would leave the session incomplete or swap its identity.
fn checked_profile(user: User, expected_id: &str) -> Result<User, AuthServiceError> {
    if user.id.trim().is_empty() {
        return Err(AuthServiceError::Server(
            "auth service returned a profile without a user id".to_string(),
        ));
    }
    if user.id != expected_id {
        warn!(expected = %expected_id, received = %user.id, "Profile belongs to another user");
        return Err(AuthServiceError::Server(
            "auth service returned a profile for another user".to_string(),
        ));
    }
    Ok(user)
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SessionStore")
            .field("status", &inner.status())
            .field("epoch", &inner.epoch)
            .field("hydrated", &inner.hydrated)
            .finish()
    }
}
