//! RepeatWise CLI - manage the local sign-in session.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use repeatwise_config::{init_logging, Config, Paths};
use tracing::debug;

/// RepeatWise CLI - sign in to RepeatWise and inspect the stored session.
#[derive(Parser)]
#[command(name = "repeatwise")]
#[command(about = "RepeatWise CLI for account sign-in and session management")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Auth service base URL; overrides the config file
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with email and password
    Login {
        /// Account email (prompted if omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Create an account and sign in
    Register {
        /// Account email (prompted if omitted)
        #[arg(short, long)]
        email: Option<String>,
        /// Display name (prompted if omitted)
        #[arg(short = 'n', long)]
        display_name: Option<String>,
    },

    /// Logout and clear the stored session
    Logout,

    /// Show the stored session without contacting the server
    Status,

    /// Re-fetch the user profile from the server
    Refresh,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    paths.ensure_dirs()?;

    let mut config = Config::load(&paths)?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
        config.validate()?;
    }

    init_logging(&config, &paths);
    debug!(api_url = %config.api_url, "Starting CLI");

    let store = commands::open_store(&config, &paths)?;
    let format = &cli.format;

    match cli.command {
        Commands::Login { email } => commands::login(&store, email, format).await,
        Commands::Register {
            email,
            display_name,
        } => commands::register(&store, email, display_name, format).await,
        Commands::Logout => commands::logout(&store, format).await,
        Commands::Status => commands::status(&store, format),
        Commands::Refresh => commands::refresh(&store, format).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
