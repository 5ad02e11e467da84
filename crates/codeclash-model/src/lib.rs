//! Shared identity types and the duel session record for Codeclash.
//!
//! Everything that is persisted to the document store lives here: the
//! validated [`DuelCode`], the [`DuelRecord`] schema, the [`DuelStatus`]
//! state machine, and the serialization boundary that turns records into
//! store documents ([`doc`]).
//!
//! The crate is deliberately free of store and runtime dependencies so the
//! state machine — in particular the pure [`next_status`] convergence
//! function — can be unit-tested without any async machinery.

mod doc;
mod error;
mod ids;
mod record;

pub use doc::{
    STATUS_FIELD, finish_patch, join_patch, ready_patch, score_patch, start_patch, status_value,
};
pub use error::ModelError;
pub use ids::{CODE_ALPHABET, CODE_LENGTH, DuelCode, PlayerId};
pub use record::{
    DuelRecord, DuelStatus, EXERCISES_PER_DUEL, Exercise, PlayerRole, PlayerSlot, ScoreUpdate,
    next_status,
};
