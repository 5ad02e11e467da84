//! Duel service configuration.

/// Tunables for the duel service.
#[derive(Debug, Clone)]
pub struct DuelConfig {
    /// Age threshold for the expiry reaper, in minutes. Records older
    /// than this are deleted regardless of status.
    pub expiry_threshold_minutes: i64,

    /// How many fresh codes creation tries before giving up on a
    /// colliding store.
    pub max_code_attempts: u32,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            expiry_threshold_minutes: 30,
            max_code_attempts: 4,
        }
    }
}

impl DuelConfig {
    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called by [`DuelService::new`](crate::DuelService::new). A
    /// non-positive threshold would reap every record on sight; a zero
    /// attempt cap could never create anything.
    pub fn validated(mut self) -> Self {
        if self.expiry_threshold_minutes < 1 {
            tracing::warn!(
                minutes = self.expiry_threshold_minutes,
                "expiry threshold below one minute — clamping to 1"
            );
            self.expiry_threshold_minutes = 1;
        }
        if self.max_code_attempts == 0 {
            tracing::warn!("max_code_attempts of 0 — clamping to 1");
            self.max_code_attempts = 1;
        }
        self
    }
}
