//! Key/value seam shared by the storage backends.

use crate::StorageResult;

/// A string key/value store that survives for as long as the backend does.
///
/// Implementations must be safe to call from several threads at once.
pub trait SecureStorage: Send + Sync {
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// `None` when the key was never written or has been deleted.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Returns `true` if the key was present.
    fn delete(&self, key: &str) -> StorageResult<bool>;

    fn has(&self, key: &str) -> StorageResult<bool> {
        self.get(key).map(|value| value.is_some())
    }
}
