//! Shared type definitions for the steamwatch tracker.
//!
//! This crate is the single source of truth for the tracking registry and
//! the domain events the reconciler produces. Every other crate in the
//! workspace depends on it; it has no async or I/O dependencies of its own.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for notification target identifiers
//! - [`registry`] -- The tracking registry aggregate and its item types
//! - [`events`] -- Domain events emitted by a reconciliation pass

pub mod events;
pub mod ids;
pub mod registry;

// Re-export all public types at crate root for convenience.
pub use events::TrackerEvent;
pub use ids::{ChannelId, Destination, GroupId};
pub use registry::{
    ItemKind, ManualMod, RegistryError, TrackedChannel, TrackedItem, TrackingRegistry,
};
