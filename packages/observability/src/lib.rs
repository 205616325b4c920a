//! # Observability
//!
//! Logging setup shared by the RepeatWise crates.
//!
//! Crates are **log producers** only. They use the standard `tracing` macros
//! and never decide where output goes; the binary calls
//! [`init_with_config`] once at startup and this crate installs the
//! subscriber:
//!
//! - an `EnvFilter` built from `RUST_LOG`, falling back to the configured level
//! - an optional compact stderr layer for interactive use
//! - an optional JSONL file layer (`~/.repeatwise/logs/client.jsonl` by default)
//!
//! Field values that carry credentials are redacted before they are written,
//! so `tracing::debug!(access_token = %token, ...)` never lands on disk.
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "cli".into(),
//!         default_level: "debug".into(),
//!         also_stderr: true,
//!         ..Default::default()
//!     });
//!
//!     tracing::info!("ready");
//! }
//! ```

mod file_sink;
mod json_layer;
mod redact;

use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use file_sink::{FileLogWriter, WriterFactory};
pub use json_layer::{JsonLayer, LogEntry};
pub use redact::{is_sensitive_key, sanitize_fields, REDACTED};

/// Runtime output policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObservabilityMode {
    /// Development: keep structured fields after secret redaction.
    #[default]
    DevVerbose,
    /// Production: keep only allow-listed metadata fields.
    ProdMetadataOnly,
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "cli", "desktop").
    /// Included in every JSONL line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// JSONL log file. `None` writes to the default location when
    /// `file_output` is set.
    pub log_path: Option<PathBuf>,

    /// Write JSONL lines to `log_path`.
    pub file_output: bool,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,

    /// Runtime output policy.
    pub mode: ObservabilityMode,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            file_output: true,
            also_stderr: false,
            mode: ObservabilityMode::DevVerbose,
        }
    }
}

/// Default JSONL location: `~/.repeatwise/logs/client.jsonl`.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".repeatwise").join("logs").join("client.jsonl"))
}

/// Initialize logging with default settings for `service_name`.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// Installing a second global subscriber is ignored. If the log file cannot
/// be opened, file output is skipped and a warning is emitted on the
/// remaining layers.
pub fn init_with_config(config: LogConfig) {
    let env_filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level))
    };

    let log_path = if config.file_output {
        config.log_path.clone().or_else(default_log_path)
    } else {
        None
    };

    let mut file_error = None;
    let json_layer = log_path.as_ref().and_then(|path| match FileLogWriter::new(path) {
        Ok(writer) => Some(
            JsonLayer::new(
                config.service_name.clone(),
                config.mode,
                WriterFactory::new(writer),
            )
            .with_filter(env_filter()),
        ),
        Err(e) => {
            file_error = Some(format!("{}: {}", path.display(), e));
            None
        }
    });

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(env_filter())
    });

    let installed = tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if !installed {
        return;
    }

    match (file_error, log_path) {
        (Some(error), _) => tracing::warn!(error = %error, "log file unavailable, file output disabled"),
        (None, Some(path)) => tracing::debug!(
            service = %config.service_name,
            log_path = %path.display(),
            "observability initialized"
        ),
        (None, None) => {}
    }
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

pub use tracing::{debug, error, info, instrument, trace, warn, Level};
