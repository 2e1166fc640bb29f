//! Batch identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::IdError;

/// Identifier of a batch: `bat_` followed by a ULID.
///
/// ULIDs sort by creation time, so batch IDs do too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BatchId(Ulid);

impl BatchId {
    pub const PREFIX: &'static str = "bat_";

    /// A fresh ID for a batch created now.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse `bat_<ulid>`, ignoring surrounding whitespace and the case of
    /// the prefix.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::Empty { kind: "batch id" });
        }

        let body = s
            .get(..Self::PREFIX.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(Self::PREFIX))
            .and_then(|_| s.get(Self::PREFIX.len()..))
            .ok_or_else(|| IdError::MalformedBatchId(s.to_string()))?;

        Ulid::from_string(body)
            .map(Self)
            .map_err(|e| IdError::InvalidUlid(e.to_string()))
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl FromStr for BatchId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BatchId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BatchId> for String {
    fn from(id: BatchId) -> Self {
        id.to_string()
    }
}
