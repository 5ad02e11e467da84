//! `CodeclashApp` builder and facade.
//!
//! This is the entry point UI collaborators consume. It ties the layers
//! together — selection → duels → store — and exposes the subsystem's
//! boundary operations on one object.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use codeclash_duel::{DuelConfig, DuelService, DuelSubscription, ExpiryReaper, SyncChannel};
use codeclash_model::{
    DuelCode, DuelRecord, EXERCISES_PER_DUEL, Exercise, PlayerId, ScoreUpdate,
};
use codeclash_select::daily_selection;
use codeclash_store::DocumentStore;
use tokio::task::JoinHandle;

use crate::CodeclashError;

/// Builder for configuring a [`CodeclashApp`].
///
/// # Example
///
/// ```rust,ignore
/// use codeclash::prelude::*;
///
/// let app = CodeclashApp::builder()
///     .pool(load_exercises())
///     .expiry_threshold_minutes(30)
///     .build(Arc::new(MemoryStore::new()))?;
/// ```
pub struct CodeclashBuilder {
    pool: Vec<Exercise>,
    config: DuelConfig,
}

impl CodeclashBuilder {
    /// Creates a builder with an empty pool and default settings.
    pub fn new() -> Self {
        Self {
            pool: Vec::new(),
            config: DuelConfig::default(),
        }
    }

    /// Replaces the candidate exercise pool.
    ///
    /// The pool's *order* matters: the daily challenge is only
    /// reproducible across clients that share the same pool in the same
    /// order.
    pub fn pool(mut self, pool: Vec<Exercise>) -> Self {
        self.pool = pool;
        self
    }

    /// Appends one exercise to the pool.
    pub fn exercise(mut self, exercise: Exercise) -> Self {
        self.pool.push(exercise);
        self
    }

    /// Sets the reaper's age threshold.
    pub fn expiry_threshold_minutes(mut self, minutes: i64) -> Self {
        self.config.expiry_threshold_minutes = minutes;
        self
    }

    /// Sets the creation-time code collision retry cap.
    pub fn max_code_attempts(mut self, attempts: u32) -> Self {
        self.config.max_code_attempts = attempts;
        self
    }

    /// Builds the app over the given store.
    ///
    /// # Errors
    /// Fails when the pool cannot cover a duel's fixed exercise count.
    pub fn build<S: DocumentStore>(
        self,
        store: Arc<S>,
    ) -> Result<CodeclashApp<S>, CodeclashError> {
        let threshold = self.config.expiry_threshold_minutes;
        let pool_size = self.pool.len();
        let duels = DuelService::new(Arc::clone(&store), self.pool, self.config)?;
        tracing::info!(pool_size, expiry_minutes = threshold, "codeclash app assembled");
        Ok(CodeclashApp {
            sync: SyncChannel::new(store),
            duels,
            expiry_threshold_minutes: threshold,
        })
    }
}

impl Default for CodeclashBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The assembled duel subsystem, generic over the backing store.
pub struct CodeclashApp<S> {
    duels: DuelService<S>,
    sync: SyncChannel<S>,
    expiry_threshold_minutes: i64,
}

impl<S: DocumentStore> CodeclashApp<S> {
    /// Creates a new builder.
    pub fn builder() -> CodeclashBuilder {
        CodeclashBuilder::new()
    }

    /// Creates a duel and returns its shareable code.
    pub async fn create_duel(
        &self,
        host_id: PlayerId,
        host_username: &str,
    ) -> Result<DuelCode, CodeclashError> {
        Ok(self.duels.create_duel(host_id, host_username).await?)
    }

    /// Joins a waiting duel; returns the materialized record snapshot.
    pub async fn join_duel(
        &self,
        code: &DuelCode,
        guest_id: PlayerId,
        guest_username: &str,
    ) -> Result<DuelRecord, CodeclashError> {
        Ok(self.duels.join_duel(code, guest_id, guest_username).await?)
    }

    /// Flags a player ready; may perform the `READY → PLAYING` transition.
    pub async fn set_ready(
        &self,
        code: &DuelCode,
        player_id: &PlayerId,
    ) -> Result<(), CodeclashError> {
        Ok(self.duels.set_ready(code, player_id).await?)
    }

    /// Applies a partial progress update; may perform the
    /// `PLAYING → FINISHED` transition.
    pub async fn update_score(
        &self,
        code: &DuelCode,
        player_id: &PlayerId,
        update: ScoreUpdate,
    ) -> Result<(), CodeclashError> {
        Ok(self.duels.update_score(code, player_id, update).await?)
    }

    /// Subscribes a callback to a duel's record.
    pub async fn subscribe<F>(
        &self,
        code: &DuelCode,
        on_change: F,
    ) -> Result<DuelSubscription, CodeclashError>
    where
        F: FnMut(DuelRecord) + Send + 'static,
    {
        Ok(self.sync.subscribe(code, on_change).await?)
    }

    /// Deletes a waiting duel; host only.
    pub async fn delete_duel(
        &self,
        code: &DuelCode,
        requester: &PlayerId,
    ) -> Result<(), CodeclashError> {
        Ok(self.duels.delete_duel(code, requester).await?)
    }

    /// Runs one best-effort expiry sweep; returns the deletion count.
    pub async fn cleanup_expired(
        &self,
        threshold_minutes: i64,
    ) -> Result<usize, CodeclashError> {
        Ok(self.duels.cleanup_expired(threshold_minutes).await?)
    }

    /// The day's challenge for `date`: five exercises every client
    /// derives identically from the calendar date alone.
    pub fn daily_exercises(&self, date: NaiveDate) -> Vec<Exercise> {
        daily_selection(date, self.duels.exercise_pool(), EXERCISES_PER_DUEL)
    }

    /// Today's challenge, by the UTC calendar.
    pub fn todays_exercises(&self) -> Vec<Exercise> {
        self.daily_exercises(Utc::now().date_naive())
    }

    /// Spawns the background expiry reaper at the configured threshold.
    /// Abort the handle to stop it.
    pub fn spawn_reaper(&self, period: Duration) -> JoinHandle<()> {
        let reaper = ExpiryReaper::new(self.duels.store(), self.expiry_threshold_minutes);
        tokio::spawn(reaper.run(period))
    }
}
