//! In-process [`StateStore`] used by tests and dry runs.
//!
//! Keeps the last saved registry in memory, counts saves, and can be told
//! to fail so callers can exercise their persistence-failure paths.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use steamwatch_types::TrackingRegistry;

use crate::StateStore;
use crate::error::StoreError;

/// A [`StateStore`] that never touches the filesystem.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<Option<TrackingRegistry>>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose first `load` returns `registry`.
    pub fn with_registry(registry: TrackingRegistry) -> Self {
        Self {
            saved: Mutex::new(Some(registry)),
            ..Self::default()
        }
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Acquire)
    }

    /// Make every subsequent save fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    /// The most recently saved registry, if any save happened or an
    /// initial registry was supplied.
    pub fn snapshot(&self) -> Option<TrackingRegistry> {
        self.saved.lock().ok().and_then(|guard| guard.clone())
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<TrackingRegistry, StoreError> {
        let guard = self
            .saved
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("memory store lock poisoned: {e}")))?;
        Ok(guard.clone().unwrap_or_default())
    }

    fn save(&self, registry: &TrackingRegistry) -> Result<(), StoreError> {
        if self.failing.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable("injected save failure".to_owned()));
        }
        let mut guard = self
            .saved
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("memory store lock poisoned: {e}")))?;
        *guard = Some(registry.clone());
        self.saves.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
