//! Error types for the store boundary.

/// Errors that can occur at the document-store boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists under the key.
    #[error("no document under key {0:?}")]
    NotFound(String),

    /// A record already exists under the key. Creation-time collision
    /// signal — callers retry with a fresh key.
    #[error("document already exists under key {0:?}")]
    AlreadyExists(String),

    /// The store could not be reached or failed transiently.
    ///
    /// The only retryable kind: callers may repeat the operation, and the
    /// store guarantees nothing about whether the failed attempt landed.
    /// [`MemoryStore`](crate::MemoryStore) never emits it; networked
    /// implementations will.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether retrying the same operation can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
