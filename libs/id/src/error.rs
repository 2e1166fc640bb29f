//! Error types for identifier parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating identifiers and codes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input is empty (after trimming, for codes).
    #[error("{kind} cannot be empty")]
    Empty { kind: &'static str },

    /// The batch ID is not `bat_` followed by a ULID.
    #[error("batch id must look like bat_<ulid>, got '{0}'")]
    MalformedBatchId(String),

    /// The ULID portion of the ID is invalid.
    #[error("invalid ULID: {0}")]
    InvalidUlid(String),

    /// The code contains a character that is not allowed.
    #[error("{kind} '{value}' contains invalid character '{ch}'")]
    InvalidCharacter {
        kind: &'static str,
        value: String,
        ch: char,
    },

    /// The code exceeds its maximum length.
    #[error("{kind} exceeds {max} characters (got {len})")]
    TooLong {
        kind: &'static str,
        max: usize,
        len: usize,
    },
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty { .. })
    }

    /// Returns true if this error indicates a rejected character.
    pub fn is_invalid_character(&self) -> bool {
        matches!(self, IdError::InvalidCharacter { .. })
    }
}
