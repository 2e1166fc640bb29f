//! Roster ingestion errors.

use std::path::PathBuf;

use seatplan_engine::StoreError;
use seatplan_id::IdError;
use serde::Serialize;
use thiserror::Error;

use crate::columns::Field;

pub type RosterResult<T> = Result<T, RosterError>;

/// Errors that abort an import as a whole.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported roster format: {0} (expected .csv, .json or .toml)")]
    UnsupportedFormat(String),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// The document parsed but does not hold a list of row objects.
    #[error("roster must be a list of rows: {0}")]
    Shape(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a single row was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("missing {0}")]
    MissingField(Field),

    #[error("invalid {field}: {source}")]
    InvalidCode {
        field: Field,
        #[source]
        source: IdError,
    },

    #[error("invalid seat number: {0:?}")]
    InvalidSeat(String),
}

/// A skipped row and the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    /// 1-based position among the data rows.
    pub row: usize,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: RejectReason,
}

fn serialize_reason<S: serde::Serializer>(
    reason: &RejectReason,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(reason)
}

impl std::fmt::Display for RowRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: {}", self.row, self.reason)
    }
}
