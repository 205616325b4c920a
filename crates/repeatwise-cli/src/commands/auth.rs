//! Authentication commands.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use session_store::{
    ActionOutcome, Credentials, Registration, SessionSnapshot, SessionStatus, SessionStore,
};
use std::io::{self, Write};

/// Read a line from stdin, trimmed.
fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

fn prompt_if_missing(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(value) => Ok(value.trim().to_string()),
        None => prompt(label),
    }
}

fn signed_in_as(snapshot: &SessionSnapshot) -> String {
    snapshot
        .user
        .as_ref()
        .map(|u| u.email.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Print the result of a login or registration attempt.
fn report_attempt(action: &str, outcome: ActionOutcome, format: &OutputFormat) -> Result<()> {
    match outcome {
        ActionOutcome::Committed(snapshot) if snapshot.is_authenticated() => {
            match format {
                OutputFormat::Text => {
                    output::print_success(&format!("Logged in as {}", signed_in_as(&snapshot)), format)
                }
                OutputFormat::Json => output::print_snapshot(&snapshot, format)?,
            }
        }
        ActionOutcome::Committed(snapshot) => {
            let reason = snapshot
                .last_error
                .map(|e| e.message)
                .unwrap_or_else(|| "unknown error".to_string());
            output::print_error(&format!("{} failed: {}", action, reason), format);
        }
        ActionOutcome::AlreadyInFlight => {
            output::print_error("Another sign-in is already in progress", format)
        }
        ActionOutcome::Superseded => {
            output::print_error(&format!("{} was interrupted", action), format)
        }
        ActionOutcome::NotApplicable | ActionOutcome::ProfileStale(_) => {}
    }
    Ok(())
}

/// Login with email and password.
pub async fn login(store: &SessionStore, email: Option<String>, format: &OutputFormat) -> Result<()> {
    let snapshot = store.snapshot();
    if snapshot.is_authenticated() {
        output::print_success(
            &format!("Already logged in as {}", signed_in_as(&snapshot)),
            format,
        );
        return Ok(());
    }

    let email = prompt_if_missing(email, "Email")?;
    if email.is_empty() {
        output::print_error("Email is required", format);
        return Ok(());
    }

    // Prompt for password (hidden)
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        output::print_error("Password is required", format);
        return Ok(());
    }

    if *format == OutputFormat::Text {
        println!("Logging in...");
    }

    let outcome = store.login(&Credentials::new(email, password)).await?;
    report_attempt("Login", outcome, format)
}

/// Create an account and sign in.
pub async fn register(
    store: &SessionStore,
    email: Option<String>,
    display_name: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let snapshot = store.snapshot();
    if snapshot.is_authenticated() {
        output::print_error(
            &format!(
                "Already logged in as {}. Log out before registering a new account",
                signed_in_as(&snapshot)
            ),
            format,
        );
        return Ok(());
    }

    let email = prompt_if_missing(email, "Email")?;
    let display_name = prompt_if_missing(display_name, "Display name")?;
    if email.is_empty() || display_name.is_empty() {
        output::print_error("Email and display name are required", format);
        return Ok(());
    }

    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password.is_empty() {
        output::print_error("Password is required", format);
        return Ok(());
    }
    if password != confirm {
        output::print_error("Passwords do not match", format);
        return Ok(());
    }

    let outcome = store
        .register(&Registration::new(email, password, display_name))
        .await?;
    report_attempt("Registration", outcome, format)
}

/// Logout and clear the stored session.
pub async fn logout(store: &SessionStore, format: &OutputFormat) -> Result<()> {
    let was_signed_in = store.status().is_authenticated();
    store.logout().await?;

    if was_signed_in {
        output::print_success("Logged out successfully", format);
    } else {
        output::print_success("Not logged in", format);
    }
    Ok(())
}

/// Show the stored session.
pub fn status(store: &SessionStore, format: &OutputFormat) -> Result<()> {
    output::print_snapshot(&store.snapshot(), format)
}

/// Re-fetch the user profile.
pub async fn refresh(store: &SessionStore, format: &OutputFormat) -> Result<()> {
    match store.refresh_profile().await? {
        ActionOutcome::Committed(snapshot) if snapshot.status == SessionStatus::Anonymous => {
            output::print_error("Session is no longer valid. Log in again", format);
        }
        ActionOutcome::Committed(snapshot) => output::print_snapshot(&snapshot, format)?,
        ActionOutcome::ProfileStale(error) => {
            output::print_error(&format!("Could not refresh profile: {}", error.message), format);
        }
        ActionOutcome::NotApplicable => output::print_error("Not logged in", format),
        ActionOutcome::Superseded | ActionOutcome::AlreadyInFlight => {
            output::print_error("Session changed during refresh", format);
        }
    }
    Ok(())
}
