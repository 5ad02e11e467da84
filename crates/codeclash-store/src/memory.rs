//! In-process implementation of the store boundary.
//!
//! One async mutex guards the whole record map. Every mutation publishes
//! the merged snapshot to the record's broadcast channel *while still
//! holding the lock*, which is what makes notification order identical to
//! write order. Dropping a record drops its sender, and watchers observe
//! the deletion as a closed channel.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::{Mutex, broadcast};

use crate::{DocWatch, DocumentStore, StoreError};

/// Per-record update channel capacity. A lagging watcher loses old
/// snapshots, not ordering; the duel protocol only ever needs the latest.
const UPDATE_CHANNEL_CAPACITY: usize = 64;

struct Entry {
    doc: Value,
    updates: broadcast::Sender<Value>,
}

/// An in-memory [`DocumentStore`].
///
/// Backs the integration tests and the demo; also usable for an offline
/// practice mode where both "clients" live in one process.
pub struct MemoryStore {
    records: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    async fn create(&self, key: &str, doc: Value) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        if records.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        records.insert(key.to_string(), Entry { doc, updates });
        tracing::debug!(key, "record created");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let records = self.records.lock().await;
        Ok(records.get(key).map(|entry| entry.doc.clone()))
    }

    async fn merge(&self, key: &str, patch: Value) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        let entry = records
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        deep_merge(&mut entry.doc, patch);
        // Receivers may all be gone; that's not an error.
        let _ = entry.updates.send(entry.doc.clone());
        Ok(())
    }

    async fn merge_if(
        &self,
        key: &str,
        field: &str,
        expected: &Value,
        patch: Value,
    ) -> Result<bool, StoreError> {
        let mut records = self.records.lock().await;
        let entry = records
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        if entry.doc.get(field) != Some(expected) {
            return Ok(false);
        }
        deep_merge(&mut entry.doc, patch);
        let _ = entry.updates.send(entry.doc.clone());
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        // Dropping the entry drops its sender, closing all watchers.
        records
            .remove(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        tracing::debug!(key, "record deleted");
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let records = self.records.lock().await;
        Ok(records.keys().cloned().collect())
    }

    async fn watch(&self, key: &str) -> Result<DocWatch, StoreError> {
        let records = self.records.lock().await;
        let entry = records
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        // Snapshot and receiver are taken under the same lock as writes,
        // so no write can fall between them.
        Ok(DocWatch {
            snapshot: entry.doc.clone(),
            updates: entry.updates.subscribe(),
        })
    }
}

/// Field-granular merge: objects merge key by key, recursing where both
/// sides are objects; anything else is replaced wholesale.
fn deep_merge(target: &mut Value, patch: Value) {
    match patch {
        Value::Object(entries) => match target {
            Value::Object(map) => {
                for (key, value) in entries {
                    match map.get_mut(&key) {
                        Some(child) if child.is_object() && value.is_object() => {
                            deep_merge(child, value);
                        }
                        _ => {
                            map.insert(key, value);
                        }
                    }
                }
            }
            other => *other = Value::Object(entries),
        },
        scalar => *target = scalar,
    }
}

// =========================================================================
// Tests
// =========================================================================
