//! Push-notification subscriptions on a duel record.
//!
//! Wraps the store's watch primitive into a callback subscription with
//! the contract the UI layers rely on: the callback fires once with the
//! current record immediately (no initial blank period), then once per
//! subsequent write in write order, until the record is deleted or the
//! subscription is torn down.

use std::sync::{Arc, Mutex};

use codeclash_model::{DuelCode, DuelRecord};
use codeclash_store::DocumentStore;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::DuelError;

/// Subscribes callbacks to duel records. Cheap to clone.
pub struct SyncChannel<S> {
    store: Arc<S>,
}

impl<S> Clone for SyncChannel<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore> SyncChannel<S> {
    /// Creates a channel over the shared store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Subscribes `on_change` to the duel's record.
    ///
    /// The callback runs on a spawned task: first with the record's state
    /// at subscription time, then with every subsequent write, in write
    /// order. Updates that fail to decode are logged and skipped — the
    /// callback never sees garbage. Deletion of the record ends the
    /// stream.
    ///
    /// Returns a handle that must be kept alive for as long as updates
    /// are wanted; dropping it (or calling
    /// [`unsubscribe`](DuelSubscription::unsubscribe)) tears the
    /// subscription down.
    pub async fn subscribe<F>(
        &self,
        code: &DuelCode,
        mut on_change: F,
    ) -> Result<DuelSubscription, DuelError>
    where
        F: FnMut(DuelRecord) + Send + 'static,
    {
        let watch = self
            .store
            .watch(code.as_str())
            .await
            .map_err(|e| DuelError::for_duel(e, code))?;
        let initial = DuelRecord::from_doc(&watch.snapshot)?;
        let code = code.clone();

        let handle = tokio::spawn(async move {
            on_change(initial);
            let mut updates = watch.updates;
            loop {
                match updates.recv().await {
                    Ok(doc) => match DuelRecord::from_doc(&doc) {
                        Ok(record) => on_change(record),
                        Err(error) => {
                            tracing::warn!(%code, %error, "skipping undecodable duel update");
                        }
                    },
                    Err(RecvError::Lagged(missed)) => {
                        // Snapshots are cumulative; the next one catches up.
                        tracing::warn!(%code, missed, "subscription lagged behind writes");
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!(%code, "duel record gone, subscription ended");
                        break;
                    }
                }
            }
        });

        Ok(DuelSubscription {
            task: Mutex::new(Some(handle)),
        })
    }
}

/// A live subscription to one duel record.
///
/// Every code path that stops needing updates must tear this down —
/// explicitly via [`unsubscribe`](Self::unsubscribe), or implicitly by
/// dropping the handle. A leaked handle keeps a live task and store watch
/// for the rest of the process.
pub struct DuelSubscription {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DuelSubscription {
    /// Stops delivery. Idempotent — second and later calls are no-ops.
    pub fn unsubscribe(&self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }

    /// Whether the subscription has not been torn down yet. (The stream
    /// may still have ended on its own if the record was deleted.)
    pub fn is_active(&self) -> bool {
        self.task
            .lock()
            .map(|task| task.is_some())
            .unwrap_or(false)
    }
}

impl Drop for DuelSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
