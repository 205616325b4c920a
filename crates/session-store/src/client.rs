//! Auth service collaborator interface.

use crate::error::AuthServiceError;
use crate::models::{AuthSession, Credentials, Registration, User};
use async_trait::async_trait;

/// Result type for auth service calls.
pub type AuthServiceResult<T> = Result<T, AuthServiceError>;

/// Remote authority that exchanges credentials for sessions.
///
/// Implementations classify every failure into an [`AuthServiceError`]; the
/// store never sees transport-level errors.
#[async_trait]
pub trait AuthServiceClient: Send + Sync {
    /// Exchange email and password for a session.
    async fn login(&self, credentials: &Credentials) -> AuthServiceResult<AuthSession>;

    /// Create an account and return its first session.
    async fn register(&self, registration: &Registration) -> AuthServiceResult<AuthSession>;

    /// Revoke the session server-side.
    async fn logout(&self, access_token: &str) -> AuthServiceResult<()>;

    /// Fetch the current user record.
    async fn refresh_profile(&self, access_token: &str) -> AuthServiceResult<User>;
}
