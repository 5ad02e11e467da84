//! Error types for the duel layer.

use codeclash_model::{DuelCode, ModelError, PlayerId};
use codeclash_store::StoreError;

/// Errors that can occur during duel operations.
///
/// Every guard violation is an ordinary `Err` value — callers map each
/// kind to a localized message and back out to a safe screen. Only
/// [`Store`](Self::Store) wrapping [`StoreError::Unavailable`] is worth
/// retrying; retry policy is the caller's decision.
#[derive(Debug, thiserror::Error)]
pub enum DuelError {
    /// No duel exists under the code.
    #[error("no duel under code {0}")]
    NotFound(DuelCode),

    /// The guest slot is already taken.
    #[error("duel {0} already has a guest")]
    AlreadyFull(DuelCode),

    /// The duel has moved past `WAITING` and can no longer be joined
    /// (or, for deletes, canceled).
    #[error("duel {0} has already started")]
    AlreadyStarted(DuelCode),

    /// A player tried to join their own duel.
    #[error("cannot join your own duel")]
    SelfJoinRejected,

    /// The requester is neither host nor guest of the duel, or lacks the
    /// right to this operation (only the host may delete).
    #[error("player {player} may not modify duel {code}")]
    Unauthorized { player: PlayerId, code: DuelCode },

    /// Every generated code collided with an existing record. With a
    /// 32^6 key space this means the store is in a pathological state,
    /// not that the caller was unlucky.
    #[error("no free duel code after {0} attempts")]
    CodeCollision(u32),

    /// The exercise pool cannot cover a duel's fixed exercise count.
    /// Construction-time error; a running service never produces it.
    #[error("exercise pool holds {have} items, need at least {need}")]
    PoolTooSmall { have: usize, need: usize },

    /// A stored document failed to decode into a duel record.
    #[error(transparent)]
    Malformed(#[from] ModelError),

    /// The store itself failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DuelError {
    /// Maps a store error from an operation on a known duel: a missing
    /// key means the duel is gone (raced with a delete or the reaper),
    /// which callers should see as `NotFound`, not a store fault.
    pub(crate) fn for_duel(err: StoreError, code: &DuelCode) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound(code.clone()),
            other => Self::Store(other),
        }
    }
}
