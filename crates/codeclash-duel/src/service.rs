//! The duel lifecycle operations.
//!
//! All coordination logic runs on the participating clients; there is no
//! server-side referee. Every mutation is a single write followed by a
//! re-read of the full record, after which the writer itself performs any
//! lifecycle transition the re-read shows to be due (the convergence
//! pattern — see [`next_status`]). Transition writes go through the
//! store's single-field conditional merge, so the harmless race of both
//! clients attempting the same transition resolves to exactly one apply.

use std::sync::Arc;

use chrono::Utc;
use codeclash_model::{
    DuelCode, DuelRecord, DuelStatus, EXERCISES_PER_DUEL, Exercise, PlayerId, PlayerSlot,
    STATUS_FIELD, ScoreUpdate, finish_patch, join_patch, next_status, ready_patch, score_patch,
    start_patch, status_value,
};
use codeclash_select::{duel_seed, generate_code, select};
use codeclash_store::DocumentStore;

use crate::{DuelConfig, DuelError, ExpiryReaper};

/// The boundary operations of the duel subsystem, generic over the store.
///
/// Cheap to clone; clones share the store and the pool.
pub struct DuelService<S> {
    store: Arc<S>,
    pool: Arc<Vec<Exercise>>,
    config: DuelConfig,
}

impl<S> Clone for DuelService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            pool: Arc::clone(&self.pool),
            config: self.config.clone(),
        }
    }
}

impl<S: DocumentStore> DuelService<S> {
    /// Creates a service over `store` drawing duels from `pool`.
    ///
    /// # Errors
    /// [`DuelError::PoolTooSmall`] when the pool cannot cover the fixed
    /// per-duel exercise count.
    pub fn new(
        store: Arc<S>,
        pool: Vec<Exercise>,
        config: DuelConfig,
    ) -> Result<Self, DuelError> {
        if pool.len() < EXERCISES_PER_DUEL {
            return Err(DuelError::PoolTooSmall {
                have: pool.len(),
                need: EXERCISES_PER_DUEL,
            });
        }
        Ok(Self {
            store,
            pool: Arc::new(pool),
            config: config.validated(),
        })
    }

    /// The shared store handle.
    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    /// The candidate pool duels are drawn from.
    pub fn exercise_pool(&self) -> &[Exercise] {
        &self.pool
    }

    /// Creates a duel: generates a code, materializes the exercise list
    /// from a time-salted seed, and persists the full record.
    ///
    /// An existing-key failure from the store is a code collision;
    /// creation retries with a fresh code up to the configured cap.
    pub async fn create_duel(
        &self,
        host_id: PlayerId,
        host_username: &str,
    ) -> Result<DuelCode, DuelError> {
        for attempt in 1..=self.config.max_code_attempts {
            let code = {
                let mut rng = rand::rng();
                generate_code(&mut rng)
            };
            let created_at = Utc::now();
            let seed = duel_seed(&code, created_at);
            let exercises = select(seed, &self.pool, EXERCISES_PER_DUEL);
            let record = DuelRecord::new(
                code.clone(),
                seed,
                PlayerSlot::new(host_id.clone(), host_username),
                exercises,
                created_at,
            );

            match self.store.create(code.as_str(), record.to_doc()?).await {
                Ok(()) => {
                    tracing::info!(%code, seed, host = %host_id, "duel created");
                    return Ok(code);
                }
                Err(codeclash_store::StoreError::AlreadyExists(_)) => {
                    tracing::warn!(%code, attempt, "duel code collision, regenerating");
                }
                Err(other) => return Err(other.into()),
            }
        }
        Err(DuelError::CodeCollision(self.config.max_code_attempts))
    }

    /// Joins a waiting duel as its guest and returns the materialized
    /// record snapshot (the guest never re-runs the selector).
    ///
    /// Guards, in order: unknown code → [`DuelError::NotFound`]; joining
    /// your own duel → [`DuelError::SelfJoinRejected`]; guest slot taken →
    /// [`DuelError::AlreadyFull`]; status past `WAITING` →
    /// [`DuelError::AlreadyStarted`]. A failed guard performs no write.
    pub async fn join_duel(
        &self,
        code: &DuelCode,
        guest_id: PlayerId,
        guest_username: &str,
    ) -> Result<DuelRecord, DuelError> {
        let record = self.fetch(code).await?;
        if record.host.player_id == guest_id {
            return Err(DuelError::SelfJoinRejected);
        }
        if record.guest.is_some() {
            return Err(DuelError::AlreadyFull(code.clone()));
        }
        if record.status != DuelStatus::Waiting {
            return Err(DuelError::AlreadyStarted(code.clone()));
        }

        let slot = PlayerSlot::new(guest_id, guest_username);
        let claimed = self
            .store
            .merge_if(
                code.as_str(),
                STATUS_FIELD,
                &status_value(DuelStatus::Waiting),
                join_patch(&slot)?,
            )
            .await
            .map_err(|e| DuelError::for_duel(e, code))?;
        if !claimed {
            // Someone else joined between our read and our claim.
            return Err(DuelError::AlreadyFull(code.clone()));
        }

        let joined = self.fetch(code).await?;
        tracing::info!(%code, guest = %slot.player_id, "guest joined, duel ready");
        Ok(joined)
    }

    /// Flags the calling player as ready, then converges: if the re-read
    /// shows both flags set, this caller performs the `READY → PLAYING`
    /// transition.
    pub async fn set_ready(
        &self,
        code: &DuelCode,
        player_id: &PlayerId,
    ) -> Result<(), DuelError> {
        let record = self.fetch(code).await?;
        let role = record
            .role_of(player_id)
            .ok_or_else(|| DuelError::Unauthorized {
                player: player_id.clone(),
                code: code.clone(),
            })?;

        self.store
            .merge(code.as_str(), ready_patch(role))
            .await
            .map_err(|e| DuelError::for_duel(e, code))?;
        tracing::debug!(%code, player = %player_id, "ready flag set");

        self.converge(code).await
    }

    /// Applies a partial progress update to the calling player's slot.
    /// Opponents' fields are never touched; updates need no ordering
    /// relative to the opponent's writes. Setting `finished_at` arms the
    /// `PLAYING → FINISHED` convergence check.
    pub async fn update_score(
        &self,
        code: &DuelCode,
        player_id: &PlayerId,
        update: ScoreUpdate,
    ) -> Result<(), DuelError> {
        if update.is_empty() {
            return Ok(());
        }
        let record = self.fetch(code).await?;
        let role = record
            .role_of(player_id)
            .ok_or_else(|| DuelError::Unauthorized {
                player: player_id.clone(),
                code: code.clone(),
            })?;

        let finishing = update.finished_at.is_some();
        self.store
            .merge(code.as_str(), score_patch(role, &update))
            .await
            .map_err(|e| DuelError::for_duel(e, code))?;

        if finishing {
            self.converge(code).await?;
        }
        Ok(())
    }

    /// Deletes a duel. Only the host may delete, and only while the duel
    /// is still waiting for a guest; anything later is the reaper's job.
    pub async fn delete_duel(
        &self,
        code: &DuelCode,
        requester: &PlayerId,
    ) -> Result<(), DuelError> {
        let record = self.fetch(code).await?;
        if record.host.player_id != *requester {
            return Err(DuelError::Unauthorized {
                player: requester.clone(),
                code: code.clone(),
            });
        }
        if record.status != DuelStatus::Waiting {
            return Err(DuelError::AlreadyStarted(code.clone()));
        }

        self.store
            .delete(code.as_str())
            .await
            .map_err(|e| DuelError::for_duel(e, code))?;
        tracing::info!(%code, "duel deleted by host");
        Ok(())
    }

    /// Deletes every record older than `threshold_minutes`, best-effort.
    /// Returns the number actually deleted.
    pub async fn cleanup_expired(&self, threshold_minutes: i64) -> Result<usize, DuelError> {
        ExpiryReaper::new(Arc::clone(&self.store), threshold_minutes)
            .sweep()
            .await
    }

    /// Re-reads the record and performs whichever lifecycle transition is
    /// now due, if any.
    ///
    /// The transition is a conditional merge guarded on the status the
    /// re-read observed, so of two clients racing to the same transition,
    /// exactly one apply lands; the loser's attempt is a clean no-op and
    /// the write-once `started_at`/`finished_at` stamps stay intact.
    async fn converge(&self, code: &DuelCode) -> Result<(), DuelError> {
        let record = self.fetch(code).await?;
        let target = next_status(&record);
        if target == record.status {
            return Ok(());
        }

        let patch = match target {
            DuelStatus::Playing => start_patch(Utc::now()),
            DuelStatus::Finished => finish_patch(Utc::now()),
            // next_status only ever proposes the two transitions above.
            _ => return Ok(()),
        };

        let advanced = self
            .store
            .merge_if(
                code.as_str(),
                STATUS_FIELD,
                &status_value(record.status),
                patch,
            )
            .await
            .map_err(|e| DuelError::for_duel(e, code))?;
        if advanced {
            tracing::info!(%code, from = %record.status, to = %target, "duel advanced");
        } else {
            tracing::debug!(%code, to = %target, "transition already performed by peer");
        }
        Ok(())
    }

    async fn fetch(&self, code: &DuelCode) -> Result<DuelRecord, DuelError> {
        match self.store.get(code.as_str()).await? {
            None => Err(DuelError::NotFound(code.clone())),
            Some(doc) => Ok(DuelRecord::from_doc(&doc)?),
        }
    }
}
