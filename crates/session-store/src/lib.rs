//! Client-side auth session store for RepeatWise.
//!
//! This crate provides:
//! - the session state machine ([`auth_fsm`])
//! - the [`AuthServiceClient`] collaborator trait and its HTTP implementation
//! - the [`SessionPersistence`] adapter over [`session_storage::SessionVault`]
//! - [`SessionStore`], which owns the session and publishes [`SessionEvent`]s
//!
//! ```ignore
//! let store = SessionStore::open(client, persistence, StoreConfig::default())?;
//! store.login(&Credentials::new("ada@example.com", "secret")).await?;
//! assert!(store.status().is_authenticated());
//! ```

pub mod auth_fsm;
mod client;
mod error;
mod http_client;
mod models;
mod persistence;
mod store;

#[cfg(test)]
mod tests;

pub use auth_fsm::{
    RetryConfig, SessionMachine, SessionMachineInput, SessionMachineState, SessionStatus,
};
pub use client::{AuthServiceClient, AuthServiceResult};
pub use error::{AuthServiceError, ClassifiedError, ErrorKind, StoreError, StoreResult};
pub use http_client::{classify_status, AuthOperation, HttpAuthClient};
pub use models::{AuthSession, Credentials, Registration, SessionSnapshot, User};
pub use persistence::SessionPersistence;
pub use store::{ActionOutcome, SessionEvent, SessionStore, StoreConfig};
