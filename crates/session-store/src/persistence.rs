//! Persistence adapter between the store and local storage.

use crate::models::{AuthSession, User};
use session_storage::{SessionVault, StorageResult, StoredSession, STORED_SESSION_VERSION};
use std::sync::Arc;

/// Synchronous local storage for the authenticated session.
///
/// The store is the only writer. Implementations must make `write` replace
/// the whole record at once.
pub trait SessionPersistence: Send + Sync {
    /// Read a complete persisted session. Invalid records are cleared and
    /// reported as absent.
    fn read(&self) -> StorageResult<Option<AuthSession>>;

    /// Replace the persisted session.
    fn write(&self, session: &AuthSession) -> StorageResult<()>;

    /// Remove the persisted session. Succeeds when nothing is stored.
    fn clear(&self) -> StorageResult<()>;
}

impl<T: SessionPersistence + ?Sized> SessionPersistence for Arc<T> {
    fn read(&self) -> StorageResult<Option<AuthSession>> {
        (**self).read()
    }

    fn write(&self, session: &AuthSession) -> StorageResult<()> {
        (**self).write(session)
    }

    fn clear(&self) -> StorageResult<()> {
        (**self).clear()
    }
}

impl From<StoredSession> for AuthSession {
    fn from(stored: StoredSession) -> Self {
        AuthSession {
            user: User {
                id: stored.user_id,
                email: stored.email,
                display_name: stored.display_name,
                locale: stored.locale,
            },
            access_token: stored.access_token,
            refresh_token: stored.refresh_token,
        }
    }
}

impl From<&AuthSession> for StoredSession {
    fn from(session: &AuthSession) -> Self {
        StoredSession {
            version: STORED_SESSION_VERSION,
            user_id: session.user.id.clone(),
            email: session.user.email.clone(),
            display_name: session.user.display_name.clone(),
            locale: session.user.locale.clone(),
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            saved_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl SessionPersistence for SessionVault {
    fn read(&self) -> StorageResult<Option<AuthSession>> {
        Ok(self.take_valid_session()?.map(AuthSession::from))
    }

    fn write(&self, session: &AuthSession) -> StorageResult<()> {
        self.set_session(&StoredSession::from(session))
    }

    fn clear(&self) -> StorageResult<()> {
        self.clear_session()
    }
}
