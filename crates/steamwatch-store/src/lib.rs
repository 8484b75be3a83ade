//! Durable state store for the steamwatch tracking registry.
//!
//! The whole [`TrackingRegistry`] is persisted as a single document. It is
//! loaded wholesale at startup and rewritten wholesale after every mutation;
//! the registry is small and writes are bounded by the polling period, so
//! there is no incremental format.
//!
//! # Modules
//!
//! - [`json_file`] -- JSON document on disk with atomic replace-on-save
//! - [`memory`] -- In-process store for tests and dry runs
//! - [`error`] -- Shared error types

pub mod error;
pub mod json_file;
pub mod memory;

use steamwatch_types::TrackingRegistry;

// Re-export primary types for convenience.
pub use error::StoreError;
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Load/save contract for the tracking registry.
///
/// `load` must return an empty registry when no prior state exists; a
/// missing file is not an error. `save` replaces the stored document in
/// full. Both are synchronous: callers hold the registry lock across a
/// save, and no `.await` may happen under that lock.
pub trait StateStore: Send + Sync {
    /// Read the persisted registry, or an empty one if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if stored state exists but cannot be read or
    /// decoded.
    fn load(&self) -> Result<TrackingRegistry, StoreError>;

    /// Replace the persisted registry with `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the document cannot be written.
    fn save(&self, registry: &TrackingRegistry) -> Result<(), StoreError>;
}
