//! TOML configuration for the hook defaults.
//!
//! Every section and field is optional; omitted values fall back to the same
//! defaults the option structs carry. Sections convert into the matching
//! option structs via `to_options()`.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::idle::{ActivityKind, IdleOptions};
use crate::socket::SocketOptions;
use crate::storage::StoreOptions;
use crate::worker::WorkerOptions;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML text did not parse.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level hook configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HooksConfig {
    /// Idle watcher defaults.
    #[serde(default)]
    pub idle: IdleSection,
    /// Reconnecting channel defaults.
    #[serde(default)]
    pub socket: SocketSection,
    /// Worker channel defaults.
    #[serde(default)]
    pub worker: WorkerSection,
    /// Key-value store namespace.
    #[serde(default)]
    pub storage: StorageSection,
}

impl HooksConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

/// `[idle]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct IdleSection {
    /// Inactivity timeout in milliseconds.
    #[serde(default = "default_idle_timeout_ms")]
    pub timeout_ms: u64,
    /// Start in the idle state.
    #[serde(default)]
    pub initial_idle: bool,
}

fn default_idle_timeout_ms() -> u64 {
    60_000
}

impl Default for IdleSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_idle_timeout_ms(),
            initial_idle: false,
        }
    }
}

impl IdleSection {
    /// Convert into watcher options.
    pub fn to_options(&self) -> IdleOptions {
        IdleOptions {
            timeout: Duration::from_millis(self.timeout_ms),
            events: ActivityKind::default_set(),
            initial_idle: self.initial_idle,
        }
    }
}

/// `[socket]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SocketSection {
    /// Auto-reconnect after a close.
    #[serde(default = "default_true")]
    pub reconnect: bool,
    /// Delay before a scheduled reconnect, in milliseconds.
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
    /// Maximum auto-reconnect attempts.
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: Option<u32>,
    /// Sub-protocols offered on connect.
    #[serde(default)]
    pub protocols: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_reconnect_interval_ms() -> u64 {
    5_000
}

fn default_reconnect_attempts() -> Option<u32> {
    Some(20)
}

impl Default for SocketSection {
    fn default() -> Self {
        Self {
            reconnect: true,
            reconnect_interval_ms: default_reconnect_interval_ms(),
            reconnect_attempts: default_reconnect_attempts(),
            protocols: Vec::new(),
        }
    }
}

impl SocketSection {
    /// Convert into channel options.
    pub fn to_options(&self) -> SocketOptions {
        SocketOptions {
            protocols: self.protocols.clone(),
            reconnect: self.reconnect,
            reconnect_interval: Duration::from_millis(self.reconnect_interval_ms),
            reconnect_attempts: self.reconnect_attempts,
        }
    }
}

/// `[worker]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSection {
    /// Reply timeout in milliseconds; omitted waits indefinitely.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Terminate the host when a reply times out.
    #[serde(default = "default_true")]
    pub terminate_on_timeout: bool,
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            terminate_on_timeout: true,
        }
    }
}

impl WorkerSection {
    /// Convert into channel options.
    pub fn to_options(&self) -> WorkerOptions {
        WorkerOptions {
            timeout: self.timeout_ms.map(Duration::from_millis),
            terminate_on_timeout: self.terminate_on_timeout,
            ..WorkerOptions::default()
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    /// Database name.
    #[serde(default = "default_database")]
    pub database: String,
    /// Object store name within the database.
    #[serde(default = "default_store")]
    pub store: String,
}

fn default_database() -> String {
    "tether".to_string()
}

fn default_store() -> String {
    "keyval".to_string()
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            database: default_database(),
            store: default_store(),
        }
    }
}

impl StorageSection {
    /// Convert into store options.
    pub fn to_options(&self) -> StoreOptions {
        StoreOptions {
            database: self.database.clone(),
            store: self.store.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = HooksConfig::from_toml("").unwrap();
        assert_eq!(config.idle.timeout_ms, 60_000);
        assert!(config.socket.reconnect);
        assert_eq!(config.socket.reconnect_attempts, Some(20));
        assert_eq!(config.worker.timeout_ms, None);
        assert_eq!(config.storage.database, "tether");
    }

    #[test]
    fn partial_sections_keep_unmentioned_defaults() {
        let config = HooksConfig::from_toml(
            r#"
            [idle]
            timeout_ms = 30000

            [socket]
            reconnect_interval_ms = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.idle.timeout_ms, 30_000);
        assert!(!config.idle.initial_idle);
        assert_eq!(config.socket.reconnect_interval_ms, 1_000);
        assert!(config.socket.reconnect);
    }

    #[test]
    fn sections_convert_to_option_structs() {
        let config = HooksConfig::from_toml(
            r#"
            [socket]
            reconnect = false
            protocols = ["graphql-ws"]

            [worker]
            timeout_ms = 250

            [storage]
            database = "app"
            store = "session"
            "#,
        )
        .unwrap();

        let socket = config.socket.to_options();
        assert!(!socket.reconnect);
        assert_eq!(socket.protocols, vec!["graphql-ws".to_string()]);

        let worker = config.worker.to_options();
        assert_eq!(worker.timeout, Some(Duration::from_millis(250)));
        assert!(worker.terminate_on_timeout);

        let storage = config.storage.to_options();
        assert_eq!(storage.database, "app");
        assert_eq!(storage.store, "session");

        let idle = config.idle.to_options();
        assert_eq!(idle.timeout, Duration::from_secs(60));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = HooksConfig::from_toml("[idle\ntimeout_ms = 1");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
