//! Configuration, file system paths and logging setup for RepeatWise clients.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, RetrySettings, DEFAULT_API_URL, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_for_service};
pub use paths::Paths;
