//! Local storage for RepeatWise clients.
//!
//! This crate provides:
//! - the [`SecureStorage`] key/value trait
//! - [`FileStorage`]: a JSON file replaced atomically, private to the user
//! - [`MemoryStorage`]: process-local storage for tests and ephemeral sessions
//! - [`SessionVault`]: reads and writes the persisted auth session

mod file;
mod keys;
mod memory;
mod traits;
mod vault;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use traits::SecureStorage;
pub use vault::{SessionVault, StoredSession, STORED_SESSION_VERSION};

use std::path::Path;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific storage error
    #[error("Platform storage error: {0}")]
    Platform(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create the file-backed storage used by the CLI.
pub fn create_storage(path: &Path) -> StorageResult<Box<dyn SecureStorage>> {
    Ok(Box::new(FileStorage::new(path)?))
}

/// Create a [`SessionVault`] over file storage at `path`.
pub fn create_session_vault(path: &Path) -> StorageResult<SessionVault> {
    Ok(SessionVault::new(create_storage(path)?))
}
