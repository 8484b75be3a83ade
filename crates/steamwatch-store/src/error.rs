//! Error types for the state store.

/// Errors that can occur while loading or saving the registry.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document is not a valid registry, or could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store refused the operation (e.g. a poisoned lock or an injected failure).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
