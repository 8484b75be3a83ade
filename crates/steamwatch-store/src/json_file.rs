//! JSON document store on the local filesystem.
//!
//! Saves go through a temporary file in the same directory that is then
//! renamed over the target, so a crash mid-write leaves the previous
//! document intact rather than a truncated one.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use steamwatch_types::TrackingRegistry;
use tempfile::NamedTempFile;

use crate::StateStore;
use crate::error::StoreError;

/// A [`StateStore`] backed by a single pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store for the document at `path`. Nothing is touched until
    /// the first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<TrackingRegistry, StoreError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "No state file yet, starting empty");
            return Ok(TrackingRegistry::new());
        }

        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(TrackingRegistry::new());
        }

        let registry: TrackingRegistry = serde_json::from_str(&raw)?;
        tracing::debug!(
            path = %self.path.display(),
            destinations = registry.destinations().len(),
            items = registry.polled_count(),
            "Loaded tracking registry"
        );
        Ok(registry)
    }

    fn save(&self, registry: &TrackingRegistry) -> Result<(), StoreError> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;

        let mut staged = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut staged, registry)?;
        staged.write_all(b"\n")?;
        staged.as_file().sync_all()?;
        staged
            .persist(&self.path)
            .map_err(|e| StoreError::Io(e.error))?;

        tracing::debug!(path = %self.path.display(), "Saved tracking registry");
        Ok(())
    }
}
