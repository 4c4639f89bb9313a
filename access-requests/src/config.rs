//! Configuration management for the access request ledger.
//!
//! Loads configuration from environment variables with sensible defaults.

use access_ledger_runtime::event_log::DEFAULT_BROADCAST_CAPACITY;
use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Fallback log filter, used when `RUST_LOG` is unset or invalid
    /// (trace, debug, info, warn, error)
    pub log_level: String,
    /// Events a live subscriber of the event log may fall behind
    pub event_log_capacity: usize,
    /// Data owner identity used by the demo
    pub demo_owner: String,
    /// Requester identity used by the demo
    pub demo_requester: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`; missing or unparsable values fall
    /// back to defaults.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            log_level: lookup("ACCESS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            event_log_capacity: lookup("ACCESS_EVENT_LOG_CAPACITY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_BROADCAST_CAPACITY),
            demo_owner: lookup("ACCESS_DEMO_OWNER").unwrap_or_else(|| "owner-1".to_string()),
            demo_requester: lookup("ACCESS_DEMO_REQUESTER")
                .unwrap_or_else(|| "requester-1".to_string()),
        }
    }
}
