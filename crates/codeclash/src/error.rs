//! Unified error type for the Codeclash subsystem.

use codeclash_duel::DuelError;
use codeclash_model::ModelError;
use codeclash_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `codeclash` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate. The
/// `#[from]` attribute on each variant auto-generates `From` impls, so
/// the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CodeclashError {
    /// A model-level error (invalid code, malformed document).
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A store-level error (missing key, collision, outage).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A duel-level error (guard violation, collision cap, pool size).
    #[error(transparent)]
    Duel(#[from] DuelError),
}

impl CodeclashError {
    /// Whether retrying the operation can succeed. Only a transient
    /// store failure qualifies; every guard violation is final.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(err) => err.is_transient(),
            Self::Duel(DuelError::Store(err)) => err.is_transient(),
            _ => false,
        }
    }
}
