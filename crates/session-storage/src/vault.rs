//! High-level API for the persisted auth session.

use crate::{SecureStorage, StorageError, StorageKeys, StorageResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Current on-disk record version.
pub const STORED_SESSION_VERSION: u32 = 1;

/// Persisted session record.
///
/// Stored as one JSON document so user and tokens are always written together.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub version: u32,
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
    /// When the record was written (RFC 3339)
    pub saved_at: String,
}

impl StoredSession {
    /// True if the record has a known version, a user id and both tokens.
    pub fn is_complete(&self) -> bool {
        self.version == STORED_SESSION_VERSION
            && !self.user_id.trim().is_empty()
            && !self.access_token.is_empty()
            && !self.refresh_token.is_empty()
    }
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("version", &self.version)
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("locale", &self.locale)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("saved_at", &self.saved_at)
            .finish()
    }
}

/// Reads and writes the [`StoredSession`] in a storage backend.
pub struct SessionVault {
    storage: Box<dyn SecureStorage>,
}

impl SessionVault {
    /// Create a new vault with the given storage backend
    pub fn new(storage: Box<dyn SecureStorage>) -> Self {
        Self { storage }
    }

    /// Retrieve the stored session, if any.
    pub fn get_session(&self) -> StorageResult<Option<StoredSession>> {
        let Some(raw) = self.storage.get(StorageKeys::SESSION)? else {
            return Ok(None);
        };

        let session: StoredSession = serde_json::from_str(&raw)
            .map_err(|e| StorageError::Encoding(format!("stored session: {}", e)))?;
        debug!(user_id = %session.user_id, "Loaded stored session");
        Ok(Some(session))
    }

    /// Replace the stored session.
    pub fn set_session(&self, session: &StoredSession) -> StorageResult<()> {
        let raw = serde_json::to_string(session)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.storage.set(StorageKeys::SESSION, &raw)?;
        debug!(user_id = %session.user_id, "Stored session");
        Ok(())
    }

    /// Check if a session record exists.
    pub fn has_session(&self) -> StorageResult<bool> {
        self.storage.has(StorageKeys::SESSION)
    }

    /// Remove the stored session. Succeeds when nothing is stored.
    pub fn clear_session(&self) -> StorageResult<()> {
        if self.storage.delete(StorageKeys::SESSION)? {
            debug!("Cleared stored session");
        }
        Ok(())
    }

    /// Read the session, clearing records that are undecodable or incomplete.
    pub fn take_valid_session(&self) -> StorageResult<Option<StoredSession>> {
        let session = match self.get_session() {
            Ok(session) => session,
            Err(StorageError::Encoding(reason)) => {
                warn!(reason = %reason, "Discarding undecodable stored session");
                self.clear_session()?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match session {
            Some(session) if session.is_complete() => Ok(Some(session)),
            Some(session) => {
                warn!(
                    user_id = %session.user_id,
                    version = session.version,
                    "Discarding incomplete stored session"
                );
                self.clear_session()?;
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
