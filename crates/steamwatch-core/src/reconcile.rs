//! The reconciliation pass: poll, diff, persist, notify.
//!
//! One pass visits every registered destination. For each destination that
//! still resolves, it snapshots the workshop mods and games tracked there,
//! looks each one up upstream with bounded concurrency, and applies the
//! outcome to the *current* registry entry:
//!
//! | Upstream says            | Registry                    | Event      |
//! |--------------------------|-----------------------------|------------|
//! | error / timeout          | untouched                   | none       |
//! | no change (empty news)   | untouched                   | none       |
//! | not found                | item removed, saved         | `Removed`  |
//! | timestamp, unseen/differs| timestamp stored, saved     | `Updated`  |
//! | timestamp, equal         | untouched                   | none       |
//!
//! Each item is saved before its notification is dispatched, so a crash can
//! at worst drop a notification, never repeat one. Notifications are
//! delivered concurrently with the remaining lookups of the destination. Manual mods have no
//! upstream and are never visited.

use std::time::{Duration, Instant};

use futures::StreamExt as _;
use futures::stream::{self, FuturesUnordered};
use steamwatch_types::{Destination, ItemKind, TrackerEvent, TrackingRegistry};
use steamwatch_upstream::{Lookup, UpstreamError, UpstreamSource};
use tracing::{debug, info, warn};

use crate::dispatch::{Delivery, Dispatcher};
use crate::tracker::{Persisted, Tracker};

/// Endpoint label for lookups cut off by the reconciler's own deadline.
const DEADLINE_ENDPOINT: &str = "reconciler deadline";

/// Per-pass limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Maximum lookups in flight at once within a destination.
    pub max_concurrent_fetches: usize,
    /// Deadline for one item's lookup. Expiry counts as a transient failure.
    pub fetch_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 4,
            fetch_timeout: Duration::from_secs(20),
        }
    }
}

/// What one pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Destinations whose items were evaluated.
    pub destinations_checked: u32,
    /// Destinations skipped because they did not resolve.
    pub destinations_skipped: u32,
    /// Items looked up upstream.
    pub items_checked: u32,
    /// `Updated` events emitted.
    pub updated: u32,
    /// `Removed` events emitted.
    pub removed: u32,
    /// Lookups that failed transiently and will be retried next pass.
    pub transient_failures: u32,
    /// Mutations whose save failed (kept in memory).
    pub save_failures: u32,
    /// Notifications the delivery collaborator did not accept.
    pub delivery_failures: u32,
    /// Every event emitted, in emission order.
    pub events: Vec<TrackerEvent>,
}

/// Drives one reconciliation pass at a time.
#[derive(Debug)]
pub struct Reconciler<S, D> {
    tracker: Tracker,
    source: S,
    dispatcher: Dispatcher<D>,
    config: ReconcilerConfig,
}

impl<S: UpstreamSource, D: Delivery> Reconciler<S, D> {
    /// Assemble a reconciler over a shared tracker.
    pub const fn new(tracker: Tracker, source: S, delivery: D, config: ReconcilerConfig) -> Self {
        Self {
            tracker,
            source,
            dispatcher: Dispatcher::new(delivery),
            config,
        }
    }

    /// Run one full pass over every registered destination.
    ///
    /// Never fails: every error is confined to the item or destination it
    /// occurred in and reported through the returned summary and the log.
    /// Dropping the returned future abandons in-flight lookups; mutations
    /// already applied stay persisted.
    pub async fn run_pass(&self) -> PassSummary {
        let started = Instant::now();
        let mut summary = PassSummary::default();
        let destinations = self.tracker.destinations().await;

        info!(destinations = destinations.len(), "Reconciliation pass starting");

        for destination in destinations {
            if !self.dispatcher.resolves(&destination).await {
                summary.destinations_skipped = summary.destinations_skipped.saturating_add(1);
                continue;
            }
            summary.destinations_checked = summary.destinations_checked.saturating_add(1);
            self.reconcile_destination(&destination, &mut summary).await;
        }

        info!(
            destinations_checked = summary.destinations_checked,
            destinations_skipped = summary.destinations_skipped,
            items_checked = summary.items_checked,
            updated = summary.updated,
            removed = summary.removed,
            transient_failures = summary.transient_failures,
            save_failures = summary.save_failures,
            delivery_failures = summary.delivery_failures,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Reconciliation pass finished"
        );
        summary
    }

    async fn reconcile_destination(&self, destination: &Destination, summary: &mut PassSummary) {
        // Unregistered since the destination list was taken.
        let Some(channel) = self.tracker.list_tracked(destination).await else {
            return;
        };

        let targets: Vec<(ItemKind, String)> = ItemKind::ALL
            .into_iter()
            .flat_map(|kind| {
                channel
                    .items(kind)
                    .iter()
                    .map(move |item| (kind, item.id.clone()))
            })
            .collect();

        debug!(%destination, items = targets.len(), "Checking destination");

        let mut lookups = stream::iter(targets)
            .map(|(kind, id)| async move {
                let outcome = self.lookup(kind, &id).await;
                (kind, id, outcome)
            })
            .buffer_unordered(self.config.max_concurrent_fetches.max(1));
        // Notifications run beside the lookups so a slow delivery never
        // leaves answered lookups unpolled past their client deadline.
        let mut deliveries = FuturesUnordered::new();

        loop {
            tokio::select! {
                Some((kind, id, outcome)) = lookups.next() => {
                    if let Some(event) = self.apply_outcome(destination, kind, &id, outcome, summary).await {
                        deliveries.push(self.announce(event.clone()));
                        summary.events.push(event);
                    }
                }
                Some(delivered) = deliveries.next(), if !deliveries.is_empty() => {
                    if !delivered {
                        summary.delivery_failures = summary.delivery_failures.saturating_add(1);
                    }
                }
                else => break,
            }
        }
    }

    /// Record one lookup outcome, persisting any resulting change.
    async fn apply_outcome(
        &self,
        destination: &Destination,
        kind: ItemKind,
        id: &str,
        outcome: Result<Lookup, UpstreamError>,
        summary: &mut PassSummary,
    ) -> Option<TrackerEvent> {
        summary.items_checked = summary.items_checked.saturating_add(1);

        let lookup = match outcome {
            Ok(lookup) => lookup,
            Err(error) => {
                summary.transient_failures = summary.transient_failures.saturating_add(1);
                warn!(
                    %destination,
                    %kind,
                    id,
                    error = %error,
                    "Upstream lookup failed, retrying next pass"
                );
                return None;
            }
        };

        let Persisted { value: event, saved } = self
            .tracker
            .update(|registry| apply_lookup(registry, destination, kind, id, &lookup))
            .await?;

        if !saved {
            summary.save_failures = summary.save_failures.saturating_add(1);
        }
        match &event {
            TrackerEvent::Updated { new_timestamp, .. } => {
                summary.updated = summary.updated.saturating_add(1);
                info!(%destination, %kind, id, new_timestamp, "Item updated upstream");
            }
            TrackerEvent::Removed { .. } => {
                summary.removed = summary.removed.saturating_add(1);
                info!(%destination, %kind, id, "Item removed upstream");
            }
        }
        Some(event)
    }

    /// Dispatch one event, reporting whether the delivery accepted it.
    async fn announce(&self, event: TrackerEvent) -> bool {
        self.dispatcher.dispatch(&event).await.is_ok()
    }

    /// Look one item up, bounded by the configured deadline.
    async fn lookup(&self, kind: ItemKind, id: &str) -> Result<Lookup, UpstreamError> {
        match tokio::time::timeout(self.config.fetch_timeout, self.source.fetch(kind, id)).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => Err(UpstreamError::Timeout {
                endpoint: DEADLINE_ENDPOINT,
            }),
        }
    }
}

/// Apply one lookup to the registry as it stands now.
///
/// Returns the event to emit, or `None` when nothing changed. The item is
/// looked up by id rather than by position so edits made by the
/// registration surface while the lookup was in flight are respected: an
/// item removed meanwhile is left alone, and a timestamp already recorded
/// is not announced twice.
fn apply_lookup(
    registry: &mut TrackingRegistry,
    destination: &Destination,
    kind: ItemKind,
    id: &str,
    lookup: &Lookup,
) -> Option<TrackerEvent> {
    let channel = registry.channel_mut(destination)?;
    match lookup {
        Lookup::NoChange => None,
        Lookup::NotFound => {
            let item = channel.take(kind, id)?;
            Some(TrackerEvent::Removed {
                destination: destination.clone(),
                kind,
                item,
            })
        }
        Lookup::Found(state) => {
            let item = channel.find_mut(kind, id)?;
            if item.last_update == Some(state.update_timestamp) {
                return None;
            }
            item.last_update = Some(state.update_timestamp);
            Some(TrackerEvent::Updated {
                destination: destination.clone(),
                kind,
                item: item.clone(),
                new_timestamp: state.update_timestamp,
            })
        }
    }
}
