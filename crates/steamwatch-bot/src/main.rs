//! Steamwatch binary.
//!
//! Polls Steam for every tracked workshop mod and game on a fixed period
//! and posts one message per detected update or removal to the Discord
//! channel that tracks it.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `steamwatch.yaml` (or `STEAMWATCH_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Open the JSON state file and load the tracking registry
//! 4. Build the Steam source and the configured delivery
//! 5. Run the scheduler until Ctrl-C or SIGTERM
//! 6. Log the run report

mod delivery;
mod discord;
mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use steamwatch_core::config::LoggingConfig;
use steamwatch_core::{Reconciler, Scheduler, ShutdownSignal, Tracker, WatchConfig};
use steamwatch_store::JsonFileStore;
use steamwatch_upstream::SteamSource;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::delivery::BotDelivery;
use crate::error::BotError;

/// Config file read when `STEAMWATCH_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "steamwatch.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any startup step fails. Once the scheduler is
/// running, the process only stops on a shutdown signal.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var("STEAMWATCH_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    init_logging(&config.logging);
    info!("steamwatch starting");
    info!(
        interval_secs = config.polling.interval_secs,
        run_on_startup = config.polling.run_on_startup,
        max_concurrent_fetches = config.polling.max_concurrent_fetches,
        data_file = %config.storage.data_file.display(),
        delivery = ?config.delivery.kind,
        "Configuration loaded"
    );

    let store = Arc::new(JsonFileStore::new(&config.storage.data_file));
    let tracker = Tracker::open(store)
        .map_err(BotError::from)
        .context("loading tracking registry")?;

    let source = SteamSource::new(&config.steam.client_config()).map_err(BotError::from)?;
    let delivery = BotDelivery::from_config(&config.delivery)?;
    info!(delivery = delivery.name(), "Delivery ready");

    let reconciler = Reconciler::new(tracker, source, delivery, config.polling.reconciler());
    let scheduler = Scheduler::new(reconciler, config.polling.scheduler());
    let shutdown = ShutdownSignal::new();

    let stop = async {
        wait_for_signal().await;
        info!("Shutdown signal received");
        shutdown.request();
    };
    let (report, ()) = tokio::join!(scheduler.run(&shutdown), stop);

    info!(
        passes_completed = report.passes_completed,
        passes_cancelled = report.passes_cancelled,
        events_emitted = report.events_emitted,
        "steamwatch shutdown complete"
    );
    Ok(())
}

/// Load configuration from `path`, falling back to defaults plus
/// environment overrides when the file does not exist.
fn load_config(path: &Path) -> Result<WatchConfig, BotError> {
    if path.exists() {
        return Ok(WatchConfig::from_file(path)?);
    }
    let mut config = WatchConfig::default();
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
