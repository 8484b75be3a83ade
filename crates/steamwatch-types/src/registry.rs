//! The tracking registry: every item tracked on behalf of every target.
//!
//! [`TrackingRegistry`] maps a group to its registered channels, and each
//! [`TrackedChannel`] holds three ordered sequences of items. The serde
//! layout matches the on-disk document the tracker has always written:
//!
//! ```text
//! { "<group>": { "<channel>": {
//!     "steam_mods":    [{"id": "..", "name": "..", "last_update": 1700000000}],
//!     "reforger_mods": [{"id": "..", "name": ".."}],
//!     "games":         [{"id": "..", "name": ".."}]
//! } } }
//! ```
//!
//! Item ids are unique per sequence. The same id may appear both as a
//! workshop mod and as a game without conflict.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{ChannelId, Destination, GroupId};

/// Errors raised by structural registry edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The destination has never been registered.
    #[error("channel {0} is not registered")]
    ChannelNotRegistered(Destination),

    /// The destination is already registered.
    #[error("channel {0} is already registered")]
    ChannelAlreadyRegistered(Destination),

    /// An item with this id already exists in the target sequence.
    #[error("{kind} {id} is already tracked in {destination}")]
    DuplicateItem {
        /// Where the insert was attempted.
        destination: Destination,
        /// Human-readable sequence name.
        kind: &'static str,
        /// The conflicting id.
        id: String,
    },

    /// No item with this id exists in the target sequence.
    #[error("{kind} {id} is not tracked in {destination}")]
    ItemNotTracked {
        /// Where the removal was attempted.
        destination: Destination,
        /// Human-readable sequence name.
        kind: &'static str,
        /// The missing id.
        id: String,
    },
}

/// The kinds of item that have an upstream source and are polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A Steam Workshop item.
    WorkshopMod,
    /// A Steam store application.
    Game,
}

impl ItemKind {
    /// Both polled kinds, in the order a pass visits them.
    pub const ALL: [Self; 2] = [Self::WorkshopMod, Self::Game];

    /// Human-readable label for logs and error messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::WorkshopMod => "workshop mod",
            Self::Game => "game",
        }
    }
}

impl core::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// A polled item: a workshop mod or a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedItem {
    /// Upstream identifier.
    pub id: String,
    /// Display name captured at registration.
    pub name: String,
    /// Last upstream update timestamp seen, in unix seconds.
    ///
    /// `None` means the item has never been observed, which is different
    /// from "observed and unchanged".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<i64>,
}

impl TrackedItem {
    /// Create an item with an optional initial observation.
    pub fn new(id: impl Into<String>, name: impl Into<String>, last_update: Option<i64>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            last_update,
        }
    }
}

/// An item with no upstream source. Listed, never polled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualMod {
    /// Identifier supplied by the operator.
    pub id: String,
    /// Display name supplied by the operator.
    pub name: String,
}

/// Everything tracked for one destination channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedChannel {
    /// Steam Workshop items.
    #[serde(default, rename = "steam_mods")]
    pub workshop_mods: Vec<TrackedItem>,
    /// Manually listed mods.
    #[serde(default, rename = "reforger_mods")]
    pub manual_mods: Vec<ManualMod>,
    /// Steam store applications.
    #[serde(default)]
    pub games: Vec<TrackedItem>,
}

impl TrackedChannel {
    /// The polled sequence for `kind`.
    pub fn items(&self, kind: ItemKind) -> &[TrackedItem] {
        match kind {
            ItemKind::WorkshopMod => &self.workshop_mods,
            ItemKind::Game => &self.games,
        }
    }

    /// Mutable access to the polled sequence for `kind`.
    pub const fn items_mut(&mut self, kind: ItemKind) -> &mut Vec<TrackedItem> {
        match kind {
            ItemKind::WorkshopMod => &mut self.workshop_mods,
            ItemKind::Game => &mut self.games,
        }
    }

    /// Look up a polled item by id.
    pub fn find(&self, kind: ItemKind, id: &str) -> Option<&TrackedItem> {
        self.items(kind).iter().find(|item| item.id == id)
    }

    /// Look up a polled item by id for mutation.
    pub fn find_mut(&mut self, kind: ItemKind, id: &str) -> Option<&mut TrackedItem> {
        self.items_mut(kind).iter_mut().find(|item| item.id == id)
    }

    /// Remove a polled item by id, returning it if it was present.
    pub fn take(&mut self, kind: ItemKind, id: &str) -> Option<TrackedItem> {
        let items = self.items_mut(kind);
        let index = items.iter().position(|item| item.id == id)?;
        Some(items.remove(index))
    }

    /// Number of polled items across both sequences.
    pub fn polled_count(&self) -> usize {
        self.workshop_mods.len().saturating_add(self.games.len())
    }
}

/// The root aggregate: every registered channel of every group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingRegistry {
    groups: BTreeMap<GroupId, BTreeMap<ChannelId, TrackedChannel>>,
}

impl TrackingRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }

    /// Whether no channel is registered.
    pub fn is_empty(&self) -> bool {
        self.groups.values().all(BTreeMap::is_empty)
    }

    /// All registered destinations, in group then channel order.
    pub fn destinations(&self) -> Vec<Destination> {
        self.groups
            .iter()
            .flat_map(|(group, channels)| {
                channels
                    .keys()
                    .map(|channel| Destination::new(group.clone(), channel.clone()))
            })
            .collect()
    }

    /// Number of polled items across the whole registry.
    pub fn polled_count(&self) -> usize {
        self.groups
            .values()
            .flat_map(BTreeMap::values)
            .map(TrackedChannel::polled_count)
            .fold(0, usize::saturating_add)
    }

    /// The channel registered at `destination`, if any.
    pub fn channel(&self, destination: &Destination) -> Option<&TrackedChannel> {
        self.groups
            .get(&destination.group)?
            .get(&destination.channel)
    }

    /// Mutable access to the channel registered at `destination`.
    pub fn channel_mut(&mut self, destination: &Destination) -> Option<&mut TrackedChannel> {
        self.groups
            .get_mut(&destination.group)?
            .get_mut(&destination.channel)
    }

    /// Like [`channel_mut`](Self::channel_mut) but reports a missing channel.
    pub fn require_channel_mut(
        &mut self,
        destination: &Destination,
    ) -> Result<&mut TrackedChannel, RegistryError> {
        self.channel_mut(destination)
            .ok_or_else(|| RegistryError::ChannelNotRegistered(destination.clone()))
    }

    /// Register a new, empty channel.
    pub fn register_channel(&mut self, destination: &Destination) -> Result<(), RegistryError> {
        let channels = self.groups.entry(destination.group.clone()).or_default();
        if channels.contains_key(&destination.channel) {
            return Err(RegistryError::ChannelAlreadyRegistered(destination.clone()));
        }
        channels.insert(destination.channel.clone(), TrackedChannel::default());
        Ok(())
    }

    /// Unregister a channel, returning everything it tracked.
    ///
    /// A group left without channels is dropped.
    pub fn unregister_channel(
        &mut self,
        destination: &Destination,
    ) -> Result<TrackedChannel, RegistryError> {
        let channels = self
            .groups
            .get_mut(&destination.group)
            .ok_or_else(|| RegistryError::ChannelNotRegistered(destination.clone()))?;
        let removed = channels
            .remove(&destination.channel)
            .ok_or_else(|| RegistryError::ChannelNotRegistered(destination.clone()))?;
        if channels.is_empty() {
            self.groups.remove(&destination.group);
        }
        Ok(removed)
    }

    /// Append a polled item to its sequence.
    pub fn insert_item(
        &mut self,
        destination: &Destination,
        kind: ItemKind,
        item: TrackedItem,
    ) -> Result<(), RegistryError> {
        let channel = self.require_channel_mut(destination)?;
        if channel.find(kind, &item.id).is_some() {
            return Err(RegistryError::DuplicateItem {
                destination: destination.clone(),
                kind: kind.label(),
                id: item.id,
            });
        }
        channel.items_mut(kind).push(item);
        Ok(())
    }

    /// Remove a polled item from its sequence.
    pub fn remove_item(
        &mut self,
        destination: &Destination,
        kind: ItemKind,
        id: &str,
    ) -> Result<TrackedItem, RegistryError> {
        self.require_channel_mut(destination)?
            .take(kind, id)
            .ok_or_else(|| RegistryError::ItemNotTracked {
                destination: destination.clone(),
                kind: kind.label(),
                id: id.to_owned(),
            })
    }

    /// Append a manual mod.
    pub fn insert_manual(
        &mut self,
        destination: &Destination,
        item: ManualMod,
    ) -> Result<(), RegistryError> {
        let channel = self.require_channel_mut(destination)?;
        if channel.manual_mods.iter().any(|m| m.id == item.id) {
            return Err(RegistryError::DuplicateItem {
                destination: destination.clone(),
                kind: MANUAL_LABEL,
                id: item.id,
            });
        }
        channel.manual_mods.push(item);
        Ok(())
    }

    /// Remove a manual mod.
    pub fn remove_manual(
        &mut self,
        destination: &Destination,
        id: &str,
    ) -> Result<ManualMod, RegistryError> {
        let channel = self.require_channel_mut(destination)?;
        let index = channel
            .manual_mods
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| RegistryError::ItemNotTracked {
                destination: destination.clone(),
                kind: MANUAL_LABEL,
                id: id.to_owned(),
            })?;
        Ok(channel.manual_mods.remove(index))
    }
}

const MANUAL_LABEL: &str = "manual mod";
