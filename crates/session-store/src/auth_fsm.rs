//! Session state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//!                      SessionRestored
//!        ┌───────────────────────────────────────────────┐
//!        │                                               ▼
//! ┌─────────────┐  LoginAttempt      ┌────────────────┐  AttemptSucceeded  ┌───────────────┐
//! │  Anonymous  │ ─────────────────► │ Authenticating │ ─────────────────► │ Authenticated │◄─┐
//! │  (initial)  │  RegisterAttempt   └───────┬────────┘                    └───────┬───────┘  │
//! └─────────────┘                            │ AttemptFailed                       │          │ ProfileRefreshed
//!        ▲                                   ▼                                     └──────────┘ ProfileRefreshFailed
//!        │ ErrorDismissed            ┌────────────────┐
//!        └────────────────────────── │     Error      │ ── LoginAttempt / RegisterAttempt ──► Authenticating
//!                                    └────────────────┘
//!
//! LogoutRequested: every state ──► Anonymous
//! SessionRejected: Authenticated ──► Anonymous
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Anonymous)

    Anonymous => {
        LoginAttempt => Authenticating,
        RegisterAttempt => Authenticating,
        SessionRestored => Authenticated,
        LogoutRequested => Anonymous
    },
    Authenticating => {
        AttemptSucceeded => Authenticated,
        AttemptFailed => Error,
        // A persisted session found while an attempt is pending wins
        SessionRestored => Authenticated,
        LogoutRequested => Anonymous
    },
    Authenticated => {
        ProfileRefreshed => Authenticated,
        ProfileRefreshFailed => Authenticated,
        // Server rejected the access token
        SessionRejected => Anonymous,
        LogoutRequested => Anonymous
    },
    Error => {
        LoginAttempt => Authenticating,
        RegisterAttempt => Authenticating,
        SessionRestored => Authenticated,
        ErrorDismissed => Anonymous,
        LogoutRequested => Anonymous
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Session status exposed to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No user, no tokens.
    Anonymous,
    /// A login or registration call is in flight.
    Authenticating,
    /// User and both tokens are present.
    Authenticated,
    /// The last login or registration failed; see `last_error`.
    Error,
}

impl SessionStatus {
    /// Returns true if the user has a valid session.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated)
    }

    /// Returns true while a credential exchange is pending.
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionStatus::Authenticating)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Anonymous => "anonymous",
            SessionStatus::Authenticating => "authenticating",
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&SessionMachineState> for SessionStatus {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Anonymous => SessionStatus::Anonymous,
            SessionMachineState::Authenticating => SessionStatus::Authenticating,
            SessionMachineState::Authenticated => SessionStatus::Authenticated,
            SessionMachineState::Error => SessionStatus::Error,
        }
    }
}

/// Retry behavior for transient profile refresh failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Initial delay between retries in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Calculate the delay after a failed attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
        let delay_ms = self.initial_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_at(inputs: &[SessionMachineInput]) -> SessionMachine {
        let mut machine = SessionMachine::new();
        for input in inputs {
            machine.consume(input).unwrap();
        }
        machine
    }

    #[test]
    fn test_initial_state_is_anonymous() {
        let machine = SessionMachine::new();
        assert_eq!(*machine.state(), SessionMachineState::Anonymous);
    }

    #[test]
    fn test_login_flow() {
        let mut machine = SessionMachine::new();

        machine.consume(&SessionMachineInput::LoginAttempt).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticating);

        machine.consume(&SessionMachineInput::AttemptSucceeded).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_register_failure_then_retry() {
        let mut machine = machine_at(&[
            SessionMachineInput::RegisterAttempt,
            SessionMachineInput::AttemptFailed,
        ]);
        assert_eq!(*machine.state(), SessionMachineState::Error);

        machine.consume(&SessionMachineInput::LoginAttempt).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticating);
    }

    #[test]
    fn test_no_second_attempt_while_authenticating() {
        let mut machine = machine_at(&[SessionMachineInput::LoginAttempt]);

        assert!(machine.consume(&SessionMachineInput::LoginAttempt).is_err());
        assert!(machine.consume(&SessionMachineInput::RegisterAttempt).is_err());
        assert_eq!(*machine.state(), SessionMachineState::Authenticating);
    }

    #[test]
    fn test_profile_refresh_stays_authenticated() {
        let mut machine = machine_at(&[SessionMachineInput::SessionRestored]);

        machine.consume(&SessionMachineInput::ProfileRefreshFailed).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
        machine.consume(&SessionMachineInput::ProfileRefreshed).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_profile_refresh_requires_session() {
        let mut machine = SessionMachine::new();
        assert!(machine.consume(&SessionMachineInput::ProfileRefreshed).is_err());
        assert!(machine.consume(&SessionMachineInput::SessionRejected).is_err());
    }

    #[test]
    fn test_logout_from_every_state() {
        let paths: [&[SessionMachineInput]; 4] = [
            &[],
            &[SessionMachineInput::LoginAttempt],
            &[SessionMachineInput::SessionRestored],
            &[
                SessionMachineInput::LoginAttempt,
                SessionMachineInput::AttemptFailed,
            ],
        ];

        for inputs in paths {
            let mut machine = machine_at(inputs);
            machine.consume(&SessionMachineInput::LogoutRequested).unwrap();
            assert_eq!(*machine.state(), SessionMachineState::Anonymous);
        }
    }

    #[test]
    fn test_error_dismissed_returns_to_anonymous() {
        let mut machine = machine_at(&[
            SessionMachineInput::LoginAttempt,
            SessionMachineInput::AttemptFailed,
        ]);
        machine.consume(&SessionMachineInput::ErrorDismissed).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Anonymous);
    }

    #[test]
    fn test_cannot_claim_success_without_attempt() {
        let mut machine = SessionMachine::new();
        assert!(machine.consume(&SessionMachineInput::AttemptSucceeded).is_err());
        assert!(machine.consume(&SessionMachineInput::AttemptFailed).is_err());
    }

    #[test]
    fn test_status_conversion() {
        assert_eq!(
            SessionStatus::from(&SessionMachineState::Anonymous),
            SessionStatus::Anonymous
        );
        assert_eq!(
            SessionStatus::from(&SessionMachineState::Authenticating),
            SessionStatus::Authenticating
        );
        assert_eq!(
            SessionStatus::from(&SessionMachineState::Authenticated),
            SessionStatus::Authenticated
        );
        assert_eq!(
            SessionStatus::from(&SessionMachineState::Error),
            SessionStatus::Error
        );
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Authenticating).unwrap(),
            "\"authenticating\""
        );
        assert_eq!(SessionStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_retry_delay_exponential_backoff() {
        let config = RetryConfig::default();

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(4000));
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(5000));
        assert_eq!(config.delay_for_attempt(80), Duration::from_millis(5000));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        let config = RetryConfig {
            max_attempts: 0,
            ..RetryConfig::default()
        };
        assert_eq!(config.attempts(), 1);
    }
}
