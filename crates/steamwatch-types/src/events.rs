//! Domain events emitted by a reconciliation pass.
//!
//! Each event carries a copy of the item as it stood once the transition
//! was applied, so the dispatcher can render it without touching the
//! registry again.

use serde::{Deserialize, Serialize};

use crate::ids::Destination;
use crate::registry::{ItemKind, TrackedItem};

/// A detected upstream transition for one tracked item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackerEvent {
    /// The upstream update timestamp changed (or was observed for the first time).
    Updated {
        /// Where the item is tracked.
        destination: Destination,
        /// Which sequence the item lives in.
        kind: ItemKind,
        /// The item after the new timestamp was stored.
        item: TrackedItem,
        /// The newly observed timestamp.
        new_timestamp: i64,
    },
    /// Upstream confirmed the item no longer exists; it has been dropped.
    Removed {
        /// Where the item was tracked.
        destination: Destination,
        /// Which sequence the item lived in.
        kind: ItemKind,
        /// The item as it was before removal.
        item: TrackedItem,
    },
}

impl TrackerEvent {
    /// The destination this event should be announced to.
    pub const fn destination(&self) -> &Destination {
        match self {
            Self::Updated { destination, .. } | Self::Removed { destination, .. } => destination,
        }
    }

    /// The kind of the affected item.
    pub const fn kind(&self) -> ItemKind {
        match self {
            Self::Updated { kind, .. } | Self::Removed { kind, .. } => *kind,
        }
    }

    /// The affected item.
    pub const fn item(&self) -> &TrackedItem {
        match self {
            Self::Updated { item, .. } | Self::Removed { item, .. } => item,
        }
    }

    /// Short name for structured logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Updated { .. } => "updated",
            Self::Removed { .. } => "removed",
        }
    }
}
