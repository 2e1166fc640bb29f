//! Storage collaborator consumed by the allocator.
//!
//! The engine never owns examinee or room records. It reads snapshots,
//! commits one placement per seat and resets placements through this trait.
//! Implementations are expected to be internally synchronized; exclusion
//! between passes over the same batch is handled by the allocator.

use seatplan_id::{BatchId, RegisterNo, RoomCode};

use crate::error::StoreError;
use crate::model::{Allocation, Examinee, Room};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

pub trait SeatingStore: Send + Sync {
    /// All unseated examinees of a batch, in no particular order.
    fn list_unseated(&self, batch_id: BatchId) -> StoreResult<Vec<Examinee>>;

    /// All rooms currently marked available, in no particular order.
    fn list_available_rooms(&self) -> StoreResult<Vec<Room>>;

    /// Seats already held by examinees of the batch.
    fn list_occupied_seats(&self, batch_id: BatchId) -> StoreResult<Vec<Allocation>>;

    /// Persist one seat assignment.
    fn commit_placement(
        &self,
        batch_id: BatchId,
        register_no: &RegisterNo,
        room: &RoomCode,
        seat: u32,
    ) -> StoreResult<()>;

    /// Return every examinee of a batch to unseated.
    ///
    /// Returns how many examinees changed; a second call returns 0.
    fn reset_placements(&self, batch_id: BatchId) -> StoreResult<usize>;
}

impl<S: SeatingStore + ?Sized> SeatingStore for std::sync::Arc<S> {
    fn list_unseated(&self, batch_id: BatchId) -> StoreResult<Vec<Examinee>> {
        (**self).list_unseated(batch_id)
    }

    fn list_available_rooms(&self) -> StoreResult<Vec<Room>> {
        (**self).list_available_rooms()
    }

    fn list_occupied_seats(&self, batch_id: BatchId) -> StoreResult<Vec<Allocation>> {
        (**self).list_occupied_seats(batch_id)
    }

    fn commit_placement(
        &self,
        batch_id: BatchId,
        register_no: &RegisterNo,
        room: &RoomCode,
        seat: u32,
    ) -> StoreResult<()> {
        (**self).commit_placement(batch_id, register_no, room, seat)
    }

    fn reset_placements(&self, batch_id: BatchId) -> StoreResult<usize> {
        (**self).reset_placements(batch_id)
    }
}
