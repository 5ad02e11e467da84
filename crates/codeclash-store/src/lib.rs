//! Keyed-document store boundary for Codeclash.
//!
//! The hosted document store is an external collaborator. This crate pins
//! down the narrow slice of it the duel protocol actually relies on —
//! keyed create/read/merge/delete plus ordered change notifications — as
//! the [`DocumentStore`] trait, and ships [`MemoryStore`], an in-process
//! implementation used by tests, demos, and local play.
//!
//! # Consistency contract
//!
//! Implementations must guarantee, and callers may only assume:
//!
//! - **Read-after-own-write**: a client's read observes that same
//!   client's earlier completed writes.
//! - **Ordered notifications**: watchers of a record receive its updates
//!   in write order. Delivery may lag arbitrarily; it is never reordered
//!   within one record.
//! - **Field-granular merges**: [`merge`](DocumentStore::merge) replaces
//!   only the fields present in the patch, recursing into nested objects,
//!   so two clients writing disjoint fields never clobber each other.
//!
//! Nothing stronger is promised — in particular, no cross-client
//! atomicity and no multi-document transactions. The duel protocol is
//! built to converge under exactly this contract.

mod error;
mod memory;

use std::future::Future;

use serde_json::Value;
use tokio::sync::broadcast;

pub use error::StoreError;
pub use memory::MemoryStore;

/// A record snapshot plus its ordered change feed, returned by
/// [`DocumentStore::watch`].
///
/// The snapshot and the receiver are taken atomically with respect to
/// writes: every write after the snapshot appears on `updates`, so there
/// is no gap between the two.
pub struct DocWatch {
    /// The record's state at subscription time.
    pub snapshot: Value,
    /// One full post-write snapshot per subsequent write, in write order.
    /// The channel closes when the record is deleted.
    pub updates: broadcast::Receiver<Value>,
}

/// The narrow store interface the duel protocol is built on.
pub trait DocumentStore: Send + Sync + 'static {
    /// Creates a new record. Fails with [`StoreError::AlreadyExists`] if
    /// the key is taken — callers use this as their collision check.
    fn create(
        &self,
        key: &str,
        doc: Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Reads a record. `Ok(None)` for an unknown key.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;

    /// Merges `patch` into the record at field granularity.
    fn merge(
        &self,
        key: &str,
        patch: Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Merges `patch` only if the record's top-level `field` currently
    /// equals `expected`. Returns whether the patch was applied.
    ///
    /// This is the one conditional primitive the protocol needs: it makes
    /// one-shot claims (joining) and convergence transitions race-free
    /// without multi-document transactions. A missing field never
    /// matches.
    fn merge_if(
        &self,
        key: &str,
        field: &str,
        expected: &Value,
        patch: Value,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Deletes a record. Watchers observe the deletion as a closed feed.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All record keys, for batch sweeps. No ordering guarantee.
    fn keys(&self) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// Subscribes to a record: current snapshot plus ordered updates.
    fn watch(&self, key: &str) -> impl Future<Output = Result<DocWatch, StoreError>> + Send;
}
