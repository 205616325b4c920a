//! Output formatting for the CLI.

use clap::ValueEnum;
use session_store::SessionSnapshot;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a success message.
pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => {
            let json = serde_json::json!({ "status": "success", "message": message });
            println!("{}", json);
        }
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            let json = serde_json::json!({ "status": "error", "message": message });
            eprintln!("{}", json);
        }
    }
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<10} {}", format!("{}:", label), value);
}

/// Print the session without its tokens.
pub fn print_snapshot(snapshot: &SessionSnapshot, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            print_row("Status", snapshot.status.as_str());
            if let Some(user) = &snapshot.user {
                print_row("User ID", &user.id);
                print_row("Email", &user.email);
                if let Some(name) = &user.display_name {
                    print_row("Name", name);
                }
                if let Some(locale) = &user.locale {
                    print_row("Locale", locale);
                }
            }
            if let Some(error) = &snapshot.last_error {
                print_row("Error", &error.to_string());
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(snapshot)?),
    }
    Ok(())
}
