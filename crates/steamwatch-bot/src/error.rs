//! Error types for the steamwatch binary.
//!
//! [`BotError`] wraps every failure that can stop the process during
//! startup. Once the scheduler is running, failures are per-item and never
//! reach this type.

/// Top-level startup error.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: steamwatch_core::config::ConfigError,
    },

    /// The persisted registry could not be loaded.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: steamwatch_store::StoreError,
    },

    /// The Steam client could not be built.
    #[error("upstream error: {source}")]
    Upstream {
        /// The underlying upstream error.
        #[from]
        source: steamwatch_upstream::UpstreamError,
    },

    /// The Discord client could not be built.
    #[error("discord error: {message}")]
    Discord {
        /// Description of the failure.
        message: String,
    },
}
