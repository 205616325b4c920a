//! CLI command implementations.

mod auth;

pub use auth::{login, logout, refresh, register, status};

use anyhow::Result;
use repeatwise_config::{Config, Paths};
use session_storage::create_session_vault;
use session_store::{HttpAuthClient, RetryConfig, SessionStore, StoreConfig};
use std::sync::Arc;

/// Store tuning taken from the config file.
pub fn store_config(config: &Config) -> StoreConfig {
    StoreConfig {
        event_capacity: config.event_capacity,
        retry: RetryConfig {
            max_attempts: config.profile_retry.max_attempts,
            initial_delay_ms: config.profile_retry.initial_delay_ms,
            max_delay_ms: config.profile_retry.max_delay_ms,
        },
    }
}

/// Open the session store over the on-disk session file.
pub fn open_store(config: &Config, paths: &Paths) -> Result<SessionStore> {
    let vault = create_session_vault(&paths.session_file())?;
    let client = HttpAuthClient::new(config.api_url()?, config.request_timeout())?;
    let store = SessionStore::open(Arc::new(client), Arc::new(vault), store_config(config))?;
    Ok(store)
}
