//! Error types for the model layer.

/// Errors that can occur while validating or (de)serializing model types.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The string is not a valid duel code: wrong length or a character
    /// outside the code alphabet.
    #[error("invalid duel code {0:?}")]
    InvalidCode(String),

    /// A stored document could not be decoded into a [`DuelRecord`](crate::DuelRecord),
    /// or a record could not be encoded into a document.
    #[error("malformed duel document: {0}")]
    MalformedDocument(#[from] serde_json::Error),
}
