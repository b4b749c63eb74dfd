//! Configuration file structures for the apalerts overlay.
//!
//! The configuration is a YAML file split into four sections: the multiworld server and
//! slots to follow, the event feed location, display settings and alert durations.
//! Any value can be overridden with an environment variable using the `APALERTS_` prefix
//! and `__` as section separator (`APALERTS_SERVER__PORT=38281`).
//!
//! # Configuration File Format
//!
//! ```yaml
//! server:
//!   host: "archipelago.gg"
//!   port: 38281
//!   slots: ["Karl", "Karl2"]
//!   password: ""
//!
//! feed:
//!   # Directory holding one <slot>.jsonl event feed per slot
//!   dir: "./feeds"
//!
//! display:
//!   lang: "de-DE"
//!   lang_source: "./lang"
//!   supported_languages: ["en", "de"]
//!   manifest: "./sources.json"
//!
//! # All durations are in milliseconds and optional
//! durations:
//!   item: 2500
//!   progression_item: 4000
//!   death: 10000
//! ```

use std::fmt;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;

/// Ports at or below this value are rejected.
const MIN_PORT_EXCLUSIVE: u16 = 20000;

/// Root configuration structure.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Multiworld server and slots
    pub server: Server,
    /// Event feed location
    pub feed: Feed,
    /// Display settings
    #[serde(default)]
    pub display: Display,
    /// Visible duration of each alert kind
    #[serde(default)]
    pub durations: Durations,
}

/// Multiworld server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    /// Domain or IP address of the server
    pub host: String,
    /// Port of the server, must be above 20000
    pub port: u16,
    /// Slots to follow, the first connected one drives countdowns
    pub slots: Vec<String>,
    /// Optional room password
    #[serde(default)]
    pub password: Option<String>,
}

impl Server {
    /// Returns the `host:port` address of the server.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feed {
    /// Directory holding one `<slot>.jsonl` file or FIFO per slot
    pub dir: String,
}

/// Display configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Display {
    /// Requested language tag, the fallback language is used when unset
    pub lang: Option<String>,
    /// Directory or `http(s)://` base URL holding the `<lang>.json` catalogs
    pub lang_source: String,
    /// Languages that have a catalog
    pub supported_languages: Vec<String>,
    /// Path to the JSON asset manifest
    pub manifest: String,
}

impl Default for Display {
    fn default() -> Self {
        Display {
            lang: None,
            lang_source: "./lang".to_owned(),
            supported_languages: vec!["en".to_owned(), "de".to_owned()],
            manifest: "./sources.json".to_owned(),
        }
    }
}

/// Visible duration of each alert kind, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Durations {
    pub connection_success: u64,
    /// Used for both failed and lost connections
    pub connection_failure: u64,
    pub item: u64,
    pub progression_item: u64,
    pub trap: u64,
    pub goal: u64,
    pub death: u64,
    pub hint: u64,
    pub meta: u64,
    pub countdown: u64,
}

impl Default for Durations {
    fn default() -> Self {
        Durations {
            connection_success: 2000,
            connection_failure: 800,
            item: 2500,
            progression_item: 4000,
            trap: 2000,
            goal: 4000,
            death: 10000,
            hint: 2000,
            meta: 2000,
            countdown: 800,
        }
    }
}

/// Errors found while validating a loaded configuration.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The server host is empty
    MissingHost,
    /// The port is not above 20000
    InvalidPort(u16),
    /// No slot, or an empty slot name, was configured
    MissingSlots,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::MissingHost => write!(f, "server host must not be empty"),
            ConfigError::InvalidPort(port) => write!(
                f,
                "server port {} is invalid, it must be between {} and 65535",
                port,
                MIN_PORT_EXCLUSIVE + 1
            ),
            ConfigError::MissingSlots => write!(f, "at least one non-empty slot is required"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Loads the configuration from a YAML file, applying `APALERTS_` environment
    /// overrides.
    pub fn load(path: &str) -> Result<Config, figment::Error> {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("APALERTS_").split("__"))
            .extract()
    }

    /// Checks the connection parameters.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.server.port <= MIN_PORT_EXCLUSIVE {
            return Err(ConfigError::InvalidPort(self.server.port));
        }
        if self.server.slots.is_empty() || self.server.slots.iter().any(|s| s.trim().is_empty())
        {
            return Err(ConfigError::MissingSlots);
        }
        Ok(())
    }
}
