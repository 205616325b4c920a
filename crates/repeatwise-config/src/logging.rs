//! Logging initialization.
//!
//! Thin wrapper over the observability crate: structured JSONL goes to
//! `~/.repeatwise/logs/client.jsonl`, with the level taken from `RUST_LOG`
//! or the configured default.

use crate::{Config, Paths};
use observability::{LogConfig, ObservabilityMode};

/// Initialize logging for the CLI.
///
/// ```ignore
/// init_logging(&config, &paths);
/// tracing::info!("ready");
/// ```
pub fn init_logging(config: &Config, paths: &Paths) {
    init_logging_for_service("cli", config, paths, false);
}

/// Initialize logging with a custom service name and optional stderr output.
pub fn init_logging_for_service(service_name: &str, config: &Config, paths: &Paths, also_stderr: bool) {
    let mode = match std::env::var("REPEATWISE_OBS_MODE")
        .unwrap_or_default()
        .to_ascii_lowercase()
        .as_str()
    {
        "prod" | "production" => ObservabilityMode::ProdMetadataOnly,
        _ => ObservabilityMode::DevVerbose,
    };

    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: config.log_level.clone(),
        log_path: Some(paths.log_file()),
        file_output: config.log_to_file,
        also_stderr,
        mode,
    });
}
