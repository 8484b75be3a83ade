//! The shared tracker handle: owned registry plus its store.
//!
//! [`Tracker`] is the single place the [`TrackingRegistry`] is mutated. It
//! is cheap to clone and is handed to the reconciler and to whatever
//! registration surface sits in front of the process (chat commands, an
//! admin API). Every mutation takes the one registry lock, edits the
//! registry, and saves the whole document before the lock is released, so
//! a registration command and a reconciliation pass can never interleave
//! partial writes.
//!
//! A failed save is logged and the in-memory edit stands. The next
//! successful save captures it. Saves are blocking file writes; on a
//! multi-threaded runtime they run in place with the worker handed off.

use std::sync::Arc;

use steamwatch_store::{StateStore, StoreError};
use steamwatch_types::{
    Destination, ItemKind, ManualMod, RegistryError, TrackedChannel, TrackedItem,
    TrackingRegistry,
};
use steamwatch_upstream::{UpstreamError, UpstreamSource};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Errors surfaced to the registration surface.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The structural edit was rejected.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Upstream could not be reached while describing a new item.
    #[error("upstream lookup failed: {0}")]
    Upstream(#[from] UpstreamError),

    /// Upstream confirms the item does not exist, so it cannot be tracked.
    #[error("{kind} {id} does not exist upstream")]
    UnknownUpstream {
        /// The requested kind.
        kind: ItemKind,
        /// The requested id.
        id: String,
    },
}

/// Result of a conditional registry edit made through [`Tracker::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persisted<T> {
    /// What the edit produced.
    pub value: T,
    /// Whether the registry was saved successfully afterwards.
    pub saved: bool,
}

/// Shared, lock-guarded handle to the tracking registry.
#[derive(Clone)]
pub struct Tracker {
    registry: Arc<Mutex<TrackingRegistry>>,
    store: Arc<dyn StateStore>,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker").finish_non_exhaustive()
    }
}

impl Tracker {
    /// Load the registry from `store` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if prior state exists but cannot be read.
    pub fn open(store: Arc<dyn StateStore>) -> Result<Self, StoreError> {
        let registry = store.load()?;
        info!(
            destinations = registry.destinations().len(),
            items = registry.polled_count(),
            "Tracking registry loaded"
        );
        Ok(Self::new(registry, store))
    }

    /// Wrap an already-loaded registry.
    pub fn new(registry: TrackingRegistry, store: Arc<dyn StateStore>) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
            store,
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Snapshot of everything tracked at `destination`.
    pub async fn list_tracked(&self, destination: &Destination) -> Option<TrackedChannel> {
        self.registry.lock().await.channel(destination).cloned()
    }

    /// All registered destinations.
    pub async fn destinations(&self) -> Vec<Destination> {
        self.registry.lock().await.destinations()
    }

    /// Snapshot of the whole registry.
    pub async fn snapshot(&self) -> TrackingRegistry {
        self.registry.lock().await.clone()
    }

    // -----------------------------------------------------------------------
    // Registration surface
    // -----------------------------------------------------------------------

    /// Start tracking a new destination channel.
    pub async fn register_channel(&self, destination: &Destination) -> Result<(), TrackerError> {
        self.mutate(|registry| registry.register_channel(destination))
            .await?;
        info!(%destination, "Channel registered");
        Ok(())
    }

    /// Stop tracking a destination channel and everything in it.
    pub async fn unregister_channel(
        &self,
        destination: &Destination,
    ) -> Result<TrackedChannel, TrackerError> {
        let removed = self
            .mutate(|registry| registry.unregister_channel(destination))
            .await?;
        info!(%destination, "Channel unregistered");
        Ok(removed)
    }

    /// Track a workshop mod with a known initial timestamp.
    pub async fn add_workshop_mod(
        &self,
        destination: &Destination,
        id: &str,
        name: &str,
        initial_update: Option<i64>,
    ) -> Result<(), TrackerError> {
        self.add_item(destination, ItemKind::WorkshopMod, id, name, initial_update)
            .await
    }

    /// Stop tracking a workshop mod.
    pub async fn remove_workshop_mod(
        &self,
        destination: &Destination,
        id: &str,
    ) -> Result<TrackedItem, TrackerError> {
        self.remove_item(destination, ItemKind::WorkshopMod, id)
            .await
    }

    /// Track a game with a known initial timestamp.
    pub async fn add_game(
        &self,
        destination: &Destination,
        id: &str,
        name: &str,
        initial_update: Option<i64>,
    ) -> Result<(), TrackerError> {
        self.add_item(destination, ItemKind::Game, id, name, initial_update)
            .await
    }

    /// Stop tracking a game.
    pub async fn remove_game(
        &self,
        destination: &Destination,
        id: &str,
    ) -> Result<TrackedItem, TrackerError> {
        self.remove_item(destination, ItemKind::Game, id).await
    }

    /// List a manual mod. It is never polled.
    pub async fn add_manual_mod(
        &self,
        destination: &Destination,
        id: &str,
        name: &str,
    ) -> Result<(), TrackerError> {
        let item = ManualMod {
            id: id.to_owned(),
            name: name.to_owned(),
        };
        self.mutate(|registry| registry.insert_manual(destination, item))
            .await?;
        info!(%destination, id, "Manual mod added");
        Ok(())
    }

    /// Remove a manual mod.
    pub async fn remove_manual_mod(
        &self,
        destination: &Destination,
        id: &str,
    ) -> Result<ManualMod, TrackerError> {
        let removed = self
            .mutate(|registry| registry.remove_manual(destination, id))
            .await?;
        info!(%destination, id, "Manual mod removed");
        Ok(removed)
    }

    /// Describe an item upstream, then track it with the name and timestamp
    /// upstream reports.
    ///
    /// Registration is checked before the network call so an unregistered
    /// channel or a duplicate id fails fast.
    pub async fn track<S: UpstreamSource>(
        &self,
        source: &S,
        destination: &Destination,
        kind: ItemKind,
        id: &str,
    ) -> Result<TrackedItem, TrackerError> {
        {
            let registry = self.registry.lock().await;
            let channel = registry
                .channel(destination)
                .ok_or_else(|| RegistryError::ChannelNotRegistered(destination.clone()))?;
            if channel.find(kind, id).is_some() {
                return Err(RegistryError::DuplicateItem {
                    destination: destination.clone(),
                    kind: kind.label(),
                    id: id.to_owned(),
                }
                .into());
            }
        }

        let description =
            source
                .describe(kind, id)
                .await?
                .ok_or_else(|| TrackerError::UnknownUpstream {
                    kind,
                    id: id.to_owned(),
                })?;

        let item = TrackedItem::new(id, description.name, description.update_timestamp);
        let stored = item.clone();
        self.mutate(|registry| registry.insert_item(destination, kind, stored))
            .await?;
        info!(%destination, %kind, id, name = item.name, "Item tracked");
        Ok(item)
    }

    // -----------------------------------------------------------------------
    // Locked edits
    // -----------------------------------------------------------------------

    /// Apply `edit` under the registry lock. If it reports a change
    /// (`Some`), the registry is saved before the lock is released.
    ///
    /// The reconciler uses this to make each item's mutate-then-persist
    /// step atomic with respect to registration commands.
    pub async fn update<T>(
        &self,
        edit: impl FnOnce(&mut TrackingRegistry) -> Option<T>,
    ) -> Option<Persisted<T>> {
        let mut registry = self.registry.lock().await;
        let value = edit(&mut registry)?;
        let saved = self.persist(&registry);
        Some(Persisted { value, saved })
    }

    async fn add_item(
        &self,
        destination: &Destination,
        kind: ItemKind,
        id: &str,
        name: &str,
        initial_update: Option<i64>,
    ) -> Result<(), TrackerError> {
        let item = TrackedItem::new(id, name, initial_update);
        self.mutate(|registry| registry.insert_item(destination, kind, item))
            .await?;
        info!(%destination, %kind, id, "Item added");
        Ok(())
    }

    async fn remove_item(
        &self,
        destination: &Destination,
        kind: ItemKind,
        id: &str,
    ) -> Result<TrackedItem, TrackerError> {
        let removed = self
            .mutate(|registry| registry.remove_item(destination, kind, id))
            .await?;
        info!(%destination, %kind, id, "Item removed");
        Ok(removed)
    }

    /// Apply a structural edit and save if it succeeded.
    async fn mutate<T>(
        &self,
        edit: impl FnOnce(&mut TrackingRegistry) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let mut registry = self.registry.lock().await;
        let value = edit(&mut registry)?;
        self.persist(&registry);
        Ok(value)
    }

    /// Save the registry; failures are reported, never fatal.
    ///
    /// Stores are synchronous. On a multi-threaded runtime the save is run
    /// through [`tokio::task::block_in_place`] so other tasks move off this
    /// worker while the file is written and synced.
    fn persist(&self, registry: &TrackingRegistry) -> bool {
        let save = || self.store.save(registry);
        let outcome = match Handle::try_current().map(|handle| handle.runtime_flavor()) {
            Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(save),
            _ => save(),
        };
        match outcome {
            Ok(()) => true,
            Err(error) => {
                warn!(
                    error = %error,
                    "Failed to persist tracking registry, keeping in-memory state"
                );
                false
            }
        }
    }
}
