//! Fixed-period driver for the reconciler.
//!
//! One pass runs to completion before the next tick is honoured. A tick
//! that fell due while a pass was running fires as soon as the pass ends,
//! and the following tick is a full period after that, so missed ticks
//! never burst.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use steamwatch_upstream::UpstreamSource;
use tokio::sync::Notify;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::dispatch::Delivery;
use crate::reconcile::Reconciler;

/// Pass cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time between pass starts.
    pub interval: Duration,
    /// Fire the first pass immediately instead of after one full period.
    pub run_on_startup: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            run_on_startup: false,
        }
    }
}

#[derive(Debug, Default)]
struct ShutdownState {
    requested: AtomicBool,
    notify: Notify,
}

/// Cloneable stop switch shared between the scheduler and whoever owns the
/// process lifetime.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    state: Arc<ShutdownState>,
}

impl ShutdownSignal {
    /// A signal that has not fired yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every waiter to stop. Idempotent.
    pub fn request(&self) {
        self.state.requested.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }

    /// Whether a stop has been requested.
    pub fn is_requested(&self) -> bool {
        self.state.requested.load(Ordering::SeqCst)
    }

    /// Resolve once a stop has been requested.
    pub async fn wait(&self) {
        let notified = self.state.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a request landing in between
        // is not missed.
        notified.as_mut().enable();
        if self.is_requested() {
            return;
        }
        notified.await;
    }
}

/// Totals for a scheduler run, returned on shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    /// Passes that ran to completion.
    pub passes_completed: u64,
    /// Passes cut short by shutdown.
    pub passes_cancelled: u64,
    /// Events emitted across all completed passes.
    pub events_emitted: u64,
}

/// Runs [`Reconciler::run_pass`] on a fixed period until shutdown.
#[derive(Debug)]
pub struct Scheduler<S, D> {
    reconciler: Reconciler<S, D>,
    config: SchedulerConfig,
}

impl<S: UpstreamSource, D: Delivery> Scheduler<S, D> {
    /// Wrap a reconciler.
    pub const fn new(reconciler: Reconciler<S, D>, config: SchedulerConfig) -> Self {
        Self { reconciler, config }
    }

    /// Loop until `shutdown` fires.
    ///
    /// A pass in flight when shutdown fires is dropped at its next await
    /// point. Items it already applied stay persisted.
    pub async fn run(&self, shutdown: &ShutdownSignal) -> ScheduleReport {
        let period = self.config.interval.max(Duration::from_millis(1));
        let now = Instant::now();
        let first = if self.config.run_on_startup {
            now
        } else {
            now.checked_add(period).unwrap_or(now)
        };
        let mut ticker = tokio::time::interval_at(first, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = period.as_secs(),
            run_on_startup = self.config.run_on_startup,
            "Scheduler started"
        );

        let mut report = ScheduleReport::default();
        loop {
            tokio::select! {
                biased;
                () = shutdown.wait() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                () = shutdown.wait() => {
                    report.passes_cancelled = report.passes_cancelled.saturating_add(1);
                    warn!("Shutdown requested mid-pass, abandoning in-flight lookups");
                    break;
                }
                summary = self.reconciler.run_pass() => {
                    report.passes_completed = report.passes_completed.saturating_add(1);
                    let emitted = u64::try_from(summary.events.len()).unwrap_or(u64::MAX);
                    report.events_emitted = report.events_emitted.saturating_add(emitted);
                }
            }
        }

        info!(
            passes_completed = report.passes_completed,
            passes_cancelled = report.passes_cancelled,
            events_emitted = report.events_emitted,
            "Scheduler stopped"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_returns_after_request() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_requested());

        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.wait().await })
        };
        tokio::task::yield_now().await;
        signal.request();

        assert!(waiter.await.is_ok());
        assert!(signal.is_requested());
    }

    #[tokio::test]
    async fn wait_after_request_is_immediate() {
        let signal = ShutdownSignal::new();
        signal.request();
        signal.request();
        signal.wait().await;
        assert!(signal.is_requested());
    }
}
