//! Expiry sweep over duel records.
//!
//! Sessions have no lifecycle timeout of their own — a duel can wait for
//! a guest forever. The reaper is the only cleanup path: an independent,
//! idempotent sweep deleting every record older than the age threshold,
//! whatever its status.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use codeclash_model::{DuelRecord, DuelStatus};
use codeclash_store::{DocumentStore, StoreError};

use crate::DuelError;

/// Deletes duel records older than a fixed age threshold.
pub struct ExpiryReaper<S> {
    store: Arc<S>,
    threshold_minutes: i64,
}

impl<S: DocumentStore> ExpiryReaper<S> {
    /// Creates a reaper deleting records older than `threshold_minutes`.
    pub fn new(store: Arc<S>, threshold_minutes: i64) -> Self {
        Self {
            store,
            threshold_minutes: threshold_minutes.max(1),
        }
    }

    /// Runs one sweep and returns how many records were deleted.
    ///
    /// Best-effort: each deletion is independent, and a failure on one
    /// record never stops the rest of the sweep — it is logged and the
    /// record is left for the next pass. Undecodable documents are
    /// skipped, not deleted. Only a failure to list keys at all aborts.
    pub async fn sweep(&self) -> Result<usize, DuelError> {
        let cutoff = Utc::now() - chrono::Duration::minutes(self.threshold_minutes);
        let mut deleted = 0usize;

        for key in self.store.keys().await? {
            let doc = match self.store.get(&key).await {
                Ok(Some(doc)) => doc,
                // Deleted under us; already what we wanted.
                Ok(None) => continue,
                Err(error) => {
                    tracing::warn!(key, %error, "sweep: read failed, skipping record");
                    continue;
                }
            };
            let record = match DuelRecord::from_doc(&doc) {
                Ok(record) => record,
                Err(error) => {
                    tracing::warn!(key, %error, "sweep: undecodable record, skipping");
                    continue;
                }
            };
            if record.created_at >= cutoff {
                continue;
            }

            if record.status != DuelStatus::Waiting {
                // Deliberate: age wins over liveness, even mid-play.
                tracing::info!(key, status = %record.status, "reaping duel past its lifetime");
            }
            match self.store.delete(&key).await {
                Ok(()) => deleted += 1,
                Err(StoreError::NotFound(_)) => {}
                Err(error) => {
                    tracing::warn!(key, %error, "sweep: delete failed, leaving for next pass");
                }
            }
        }

        if deleted > 0 {
            tracing::info!(deleted, threshold_minutes = self.threshold_minutes, "expiry sweep done");
        }
        Ok(deleted)
    }

    /// Runs [`sweep`](Self::sweep) forever on a fixed period. Meant to be
    /// spawned; sweep failures are logged, never fatal.
    pub async fn run(self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if let Err(error) = self.sweep().await {
                tracing::warn!(%error, "expiry sweep failed");
            }
        }
    }
}
