//! Configuration loading and typed config structures for steamwatch.
//!
//! The configuration lives in `steamwatch.yaml`. This module defines
//! strongly-typed structs that mirror the YAML structure and a loader that
//! reads the file, applies environment overrides for secrets, and validates
//! the result. Every section is optional; a missing file yields the
//! defaults documented on each field.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use steamwatch_upstream::SteamClientConfig;

use crate::reconcile::ReconcilerConfig;
use crate::scheduler::SchedulerConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but is not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level steamwatch configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WatchConfig {
    /// Polling cadence and per-pass limits.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Where the registry document lives.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Steam endpoint settings.
    #[serde(default)]
    pub steam: SteamConfig,

    /// How notifications leave the process.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WatchConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for secrets and paths:
    /// - `STEAM_API_KEY` overrides `steam.api_key`
    /// - `DISCORD_BOT_TOKEN` overrides `delivery.bot_token`
    /// - `STEAMWATCH_DATA_FILE` overrides `storage.data_file`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("STEAM_API_KEY").filter(|v| !v.is_empty()) {
            self.steam.api_key = Some(val);
        }
        if let Some(val) = lookup("DISCORD_BOT_TOKEN").filter(|v| !v.is_empty()) {
            self.delivery.bot_token = Some(val);
        }
        if let Some(val) = lookup("STEAMWATCH_DATA_FILE").filter(|v| !v.is_empty()) {
            self.storage.data_file = PathBuf::from(val);
        }
    }

    /// Reject values the tracker cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "polling.interval_secs must be positive".to_owned(),
            ));
        }
        if self.polling.max_concurrent_fetches == 0 {
            return Err(ConfigError::Invalid(
                "polling.max_concurrent_fetches must be positive".to_owned(),
            ));
        }
        if self.polling.fetch_timeout_ms == 0 || self.steam.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeouts must be positive".to_owned()));
        }
        if self.delivery.kind == DeliveryKind::Discord && self.delivery.bot_token.is_none() {
            return Err(ConfigError::Invalid(
                "delivery.kind is discord but no bot token is configured (set DISCORD_BOT_TOKEN)"
                    .to_owned(),
            ));
        }
        Ok(())
    }
}

/// Polling cadence and per-pass limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PollingConfig {
    /// Seconds between the start of one pass and the next.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Run the first pass at startup instead of one full interval later.
    #[serde(default)]
    pub run_on_startup: bool,

    /// Maximum upstream lookups in flight at once within a pass.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Deadline for a single item's lookup (all of its HTTP calls).
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

impl PollingConfig {
    /// Scheduler settings derived from this section.
    pub const fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::from_secs(self.interval_secs),
            run_on_startup: self.run_on_startup,
        }
    }

    /// Reconciler settings derived from this section.
    pub const fn reconciler(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            max_concurrent_fetches: self.max_concurrent_fetches,
            fetch_timeout: Duration::from_millis(self.fetch_timeout_ms),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            run_on_startup: false,
            max_concurrent_fetches: default_max_concurrent_fetches(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

/// Where the registry document lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON registry document.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
        }
    }
}

/// Steam endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SteamConfig {
    /// Steam Web API base URL.
    #[serde(default = "default_web_api_url")]
    pub web_api_url: String,

    /// Steam store API base URL.
    #[serde(default = "default_store_api_url")]
    pub store_api_url: String,

    /// Steam Web API key. Usually supplied via `STEAM_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Deadline for each HTTP call.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl SteamConfig {
    /// Client settings for [`steamwatch_upstream::SteamSource`].
    pub fn client_config(&self) -> SteamClientConfig {
        SteamClientConfig {
            web_api_url: self.web_api_url.clone(),
            store_api_url: self.store_api_url.clone(),
            api_key: self.api_key.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }
}

impl Default for SteamConfig {
    fn default() -> Self {
        Self {
            web_api_url: default_web_api_url(),
            store_api_url: default_store_api_url(),
            api_key: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Which delivery collaborator carries notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryKind {
    /// Post to Discord channels through the REST API.
    Discord,
    /// Write notifications to the log only.
    #[default]
    Log,
}

/// How notifications leave the process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeliveryConfig {
    /// Delivery collaborator to use.
    #[serde(default)]
    pub kind: DeliveryKind,

    /// Discord REST API base URL.
    #[serde(default = "default_discord_api_url")]
    pub discord_api_url: String,

    /// Discord bot token. Usually supplied via `DISCORD_BOT_TOKEN`.
    #[serde(default)]
    pub bot_token: Option<String>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            kind: DeliveryKind::default(),
            discord_api_url: default_discord_api_url(),
            bot_token: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_interval_secs() -> u64 {
    300
}

const fn default_max_concurrent_fetches() -> usize {
    4
}

const fn default_fetch_timeout_ms() -> u64 {
    20_000
}

const fn default_request_timeout_ms() -> u64 {
    8_000
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data.json")
}

fn default_web_api_url() -> String {
    "https://api.steampowered.com".to_owned()
}

fn default_store_api_url() -> String {
    "https://store.steampowered.com/api".to_owned()
}

fn default_discord_api_url() -> String {
    "https://discord.com/api/v10".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}
