//! Identity types: players and duel join codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

// ---------------------------------------------------------------------------
// PlayerId
// ---------------------------------------------------------------------------

/// A player's stable identifier, as issued by the identity provider.
///
/// Opaque to this subsystem — we never parse it, only compare it. The
/// newtype keeps it from being confused with usernames or codes in
/// signatures, and `#[serde(transparent)]` makes it persist as a plain
/// JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Wraps an identity-provider id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// DuelCode
// ---------------------------------------------------------------------------

/// The 32-symbol alphabet duel codes are drawn from.
///
/// Uppercase letters and digits with `I`, `O`, `0`, `1` excluded — those
/// four are too easy to confuse when a code is read aloud or handwritten.
pub const CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of every duel code.
pub const CODE_LENGTH: usize = 6;

/// A six-character duel join code. Doubles as the record's store key.
///
/// Validated on construction: exactly [`CODE_LENGTH`] characters, all drawn
/// from [`CODE_ALPHABET`]. Serde round-trips through the validated string
/// form, so a malformed code in a stored document fails to decode instead
/// of leaking into the model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DuelCode(String);

impl DuelCode {
    /// Validates and wraps a code string.
    pub fn parse(code: impl Into<String>) -> Result<Self, ModelError> {
        let code = code.into();
        if code.len() != CODE_LENGTH
            || !code.bytes().all(|b| CODE_ALPHABET.contains(&b))
        {
            return Err(ModelError::InvalidCode(code));
        }
        Ok(Self(code))
    }

    /// The raw code string (also the store key).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DuelCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for DuelCode {
    type Error = ModelError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::parse(code)
    }
}

impl From<DuelCode> for String {
    fn from(code: DuelCode) -> Self {
        code.0
    }
}

impl FromStr for DuelCode {
    type Err = ModelError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Self::parse(code)
    }
}

// =========================================================================
// Tests
// =========================================================================
