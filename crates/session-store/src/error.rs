//! Error types for the session store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed auth operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidCredentials,
    EmailTaken,
    ValidationError,
    Unauthorized,
    RateLimited,
    NetworkError,
    ServerError,
    /// Local persistence failed. Never stored in `last_error`.
    StorageError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidCredentials => "invalid_credentials",
            ErrorKind::EmailTaken => "email_taken",
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::ServerError => "server_error",
            ErrorKind::StorageError => "storage_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error kind with a human-readable message, as surfaced to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Failure reported by an [`AuthServiceClient`](crate::AuthServiceClient).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthServiceError {
    /// Wrong email or password
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Registration email already in use
    #[error("Email already registered: {0}")]
    EmailTaken(String),

    /// Registration details rejected by the server
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Access token rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Too many requests
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Connection, timeout or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// 5xx, unexpected status or undecodable response
    #[error("Server error: {0}")]
    Server(String),
}

impl AuthServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthServiceError::InvalidCredentials(_) => ErrorKind::InvalidCredentials,
            AuthServiceError::EmailTaken(_) => ErrorKind::EmailTaken,
            AuthServiceError::Validation(_) => ErrorKind::ValidationError,
            AuthServiceError::Unauthorized(_) => ErrorKind::Unauthorized,
            AuthServiceError::RateLimited(_) => ErrorKind::RateLimited,
            AuthServiceError::Network(_) => ErrorKind::NetworkError,
            AuthServiceError::Server(_) => ErrorKind::ServerError,
        }
    }

    /// The message carried by the error, without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            AuthServiceError::InvalidCredentials(m)
            | AuthServiceError::EmailTaken(m)
            | AuthServiceError::Validation(m)
            | AuthServiceError::Unauthorized(m)
            | AuthServiceError::RateLimited(m)
            | AuthServiceError::Network(m)
            | AuthServiceError::Server(m) => m,
        }
    }

    pub fn classify(&self) -> ClassifiedError {
        ClassifiedError::new(self.kind(), self.message())
    }

    /// Returns true if this error is transient and the operation can be retried.
    ///
    /// Rate limiting is not retried: the server asked us to back off.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AuthServiceError::Network(_) | AuthServiceError::Server(_)
        )
    }
}

/// Contract violations raised by [`SessionStore`](crate::SessionStore).
///
/// Collaborator failures are not errors at this level; they are committed to
/// the session state instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Caller passed empty or malformed input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),
}

/// Result type alias using StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient_network() {
        assert!(AuthServiceError::Network("connection refused".into()).is_transient());
    }

    #[test]
    fn test_is_transient_server() {
        assert!(AuthServiceError::Server("HTTP 503".into()).is_transient());
    }

    #[test]
    fn test_is_not_transient_rate_limited() {
        assert!(!AuthServiceError::RateLimited("slow down".into()).is_transient());
    }

    #[test]
    fn test_is_not_transient_unauthorized() {
        assert!(!AuthServiceError::Unauthorized("expired".into()).is_transient());
    }

    #[test]
    fn test_classify_keeps_message() {
        let classified = AuthServiceError::EmailTaken("a@b.com is in use".into()).classify();
        assert_eq!(classified.kind, ErrorKind::EmailTaken);
        assert_eq!(classified.message, "a@b.com is in use");
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ClassifiedError::new(
            ErrorKind::InvalidCredentials,
            "nope",
        ))
        .unwrap();
        assert_eq!(json, r#"{"kind":"invalid_credentials","message":"nope"}"#);
        assert_eq!(ErrorKind::ValidationError.to_string(), "validation_error");
    }
}
