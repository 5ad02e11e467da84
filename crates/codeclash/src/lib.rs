//! # Codeclash
//!
//! Duel coordination and deterministic content selection for a gamified
//! coding-literacy trainer.
//!
//! Two clients agree — without a central application server — on a shared
//! exercise set, a strictly-ordered duel lifecycle, and a single
//! race-free resolution of who finished, using nothing but a shared
//! record in a document store and push notifications on it. The same
//! seeded-selection primitive also powers the daily challenge, where
//! every client re-derives the day's exercises from the calendar date
//! with no shared state at all.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use codeclash::prelude::*;
//!
//! # async fn run(pool: Vec<Exercise>) -> Result<(), CodeclashError> {
//! let app = CodeclashApp::<MemoryStore>::builder()
//!     .pool(pool)
//!     .build(Arc::new(MemoryStore::new()))?;
//!
//! let code = app.create_duel(PlayerId::new("uid-1"), "ada").await?;
//! // share `code` with an opponent out of band...
//! # Ok(())
//! # }
//! ```

mod app;
mod error;

pub use app::{CodeclashApp, CodeclashBuilder};
pub use error::CodeclashError;

pub use codeclash_duel::{
    DuelConfig, DuelError, DuelService, DuelSubscription, ExpiryReaper, SyncChannel,
};
pub use codeclash_model::{
    CODE_ALPHABET, CODE_LENGTH, DuelCode, DuelRecord, DuelStatus, EXERCISES_PER_DUEL, Exercise,
    ModelError, PlayerId, PlayerRole, PlayerSlot, ScoreUpdate, next_status,
};
pub use codeclash_select::{
    daily_seed, daily_selection, duel_seed, generate_code, seed_from_str, select, shuffle,
};
pub use codeclash_store::{DocWatch, DocumentStore, MemoryStore, StoreError};

/// The common imports, for `use codeclash::prelude::*`.
pub mod prelude {
    pub use crate::{
        CodeclashApp, CodeclashBuilder, CodeclashError, DocumentStore, DuelCode, DuelRecord,
        DuelStatus, DuelSubscription, Exercise, MemoryStore, PlayerId, ScoreUpdate,
    };
}
