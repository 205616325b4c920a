//! Storage key constants.

/// Storage keys used by RepeatWise clients.
pub struct StorageKeys;

impl StorageKeys {
    /// Persisted auth session (JSON `StoredSession`)
    pub const SESSION: &'static str = "repeatwise.session";
}
