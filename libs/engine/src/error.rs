//! Error types for the allocation engine and its store.

use seatplan_id::{BatchId, RegisterNo, RoomCode};
use thiserror::Error;

/// Result type for allocation operations.
pub type EngineResult<T> = Result<T, AllocationError>;

/// Errors that can abort an allocation pass.
///
/// Capacity shortfall is not one of them: a pass that cannot seat everyone
/// still succeeds and reports the remainder as data.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// No available room with positive capacity was supplied.
    #[error("no available rooms found for allocation")]
    NoRoomsAvailable,

    /// Planner configuration is unusable.
    #[error("invalid planner configuration: {0}")]
    InvalidConfig(String),

    /// The store collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by [`crate::SeatingStore`] implementations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("batch not found: {0}")]
    BatchNotFound(BatchId),

    #[error("batch name already in use: {0}")]
    DuplicateBatchName(String),

    #[error("examinee {register_no} not found in batch {batch_id}")]
    ExamineeNotFound {
        batch_id: BatchId,
        register_no: RegisterNo,
    },

    #[error("room not found: {0}")]
    RoomNotFound(RoomCode),

    #[error("room already exists: {0}")]
    DuplicateRoom(RoomCode),

    #[error("invalid record: {0}")]
    Invalid(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns true if this error means the addressed record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BatchNotFound(_) | Self::ExamineeNotFound { .. } | Self::RoomNotFound(_)
        )
    }
}

/// Errors from constructing model values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("room {0} must have a capacity greater than zero")]
    ZeroCapacity(RoomCode),

    #[error("seat number must be greater than zero")]
    ZeroSeat,

    #[error("unknown exam type '{0}' (expected end_semester, arrear or internal)")]
    UnknownExamType(String),
}
