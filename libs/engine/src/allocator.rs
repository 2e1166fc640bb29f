//! Store-backed allocation: snapshot, plan, commit.
//!
//! The allocator is responsible for:
//! - Fetching the unseated examinees of a batch, the available rooms and the
//!   seats already held in the batch
//! - Ordering rooms ground floor first, then by code, so identical data
//!   always plans identically
//! - Running the pass and committing one placement per assigned seat
//! - Serializing passes, resets and refreshes per batch
//!
//! Two concurrent passes over one batch could both see the same examinee as
//! unseated and seat it twice, so every operation here holds the batch's lock
//! for its whole duration. Different batches do not contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use seatplan_id::BatchId;
use tracing::{debug, info, instrument, warn};

use crate::error::{AllocationError, EngineResult};
use crate::model::{sort_rooms, AllocationResult};
use crate::filler::OccupiedSeats;
use crate::pass::plan_pass_around;
use crate::planner::PlanConfig;
use crate::store::SeatingStore;

/// Per-batch mutual exclusion.
///
/// Entries live only while some caller holds or waits on them, so a
/// long-running allocator does not accumulate one mutex per batch it has
/// ever seen.
#[derive(Debug, Default)]
pub struct BatchLocks {
    locks: Mutex<HashMap<BatchId, Arc<Mutex<()>>>>,
}

impl BatchLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `batch_id`.
    pub fn with_batch<T>(&self, batch_id: BatchId, f: impl FnOnce() -> T) -> T {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(batch_id).or_default())
        };
        let out = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        // Clones are only taken under the map lock, so a count of two (the
        // map's and ours) means nobody else is holding or waiting.
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&batch_id);
        }
        out
    }

    /// Number of batches with a caller holding or waiting on their lock.
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Result of a refresh: how many seats were cleared, then the new pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub reset_count: usize,
    pub result: AllocationResult,
}

/// Seat allocator over a [`SeatingStore`].
pub struct Allocator<S> {
    store: S,
    config: PlanConfig,
    locks: BatchLocks,
}

impl<S: SeatingStore> Allocator<S> {
    /// Create an allocator, validating the planner configuration.
    pub fn new(store: S, config: PlanConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            locks: BatchLocks::new(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    /// Seat the batch's unseated examinees into the available rooms.
    ///
    /// Fails with [`AllocationError::NoRoomsAvailable`] before touching the
    /// store when no room is available.
    #[instrument(skip(self), fields(batch_id = %batch_id))]
    pub fn run_pass(&self, batch_id: BatchId) -> EngineResult<AllocationResult> {
        self.locks.with_batch(batch_id, || self.run_pass_locked(batch_id))
    }

    /// Clear every placement in the batch, then run a fresh pass.
    ///
    /// Room availability is checked first so a refresh with no rooms leaves
    /// existing seats untouched.
    #[instrument(skip(self), fields(batch_id = %batch_id))]
    pub fn refresh(&self, batch_id: BatchId) -> EngineResult<RefreshOutcome> {
        self.locks.with_batch(batch_id, || {
            if self.store.list_available_rooms()?.is_empty() {
                return Err(AllocationError::NoRoomsAvailable);
            }

            let reset_count = self.store.reset_placements(batch_id)?;
            info!(reset_count, "Placements reset for refresh");

            let result = self.run_pass_locked(batch_id)?;
            Ok(RefreshOutcome {
                reset_count,
                result,
            })
        })
    }

    /// Return every examinee of the batch to unseated.
    #[instrument(skip(self), fields(batch_id = %batch_id))]
    pub fn reset(&self, batch_id: BatchId) -> EngineResult<usize> {
        self.locks.with_batch(batch_id, || {
            let reset_count = self.store.reset_placements(batch_id)?;
            info!(reset_count, "Placements reset");
            Ok(reset_count)
        })
    }

    fn run_pass_locked(&self, batch_id: BatchId) -> EngineResult<AllocationResult> {
        let mut rooms = self.store.list_available_rooms()?;
        if rooms.is_empty() {
            return Err(AllocationError::NoRoomsAvailable);
        }
        sort_rooms(&mut rooms);

        let examinees = self.store.list_unseated(batch_id)?;
        let occupied: OccupiedSeats = self
            .store
            .list_occupied_seats(batch_id)?
            .into_iter()
            .map(|a| (a.room, a.seat))
            .collect();
        if !occupied.is_empty() {
            debug!(
                occupied = rooms.iter().map(|r| occupied.taken_within(r)).sum::<u32>(),
                "Planning around seats already held"
            );
        }

        let result = plan_pass_around(&examinees, &rooms, &self.config, &occupied)?;

        for allocation in &result.allocations {
            self.store.commit_placement(
                batch_id,
                &allocation.register_no,
                &allocation.room,
                allocation.seat,
            )?;
        }

        if result.unseated_remaining > 0 {
            warn!(
                unseated = result.unseated_remaining,
                free_seats = rooms
                    .iter()
                    .map(|r| u64::from(r.capacity() - occupied.taken_within(r)))
                    .sum::<u64>(),
                "Not enough seats for every examinee"
            );
        }

        info!(
            rooms = rooms.len(),
            examinees = examinees.len(),
            placed = result.placed_count,
            unseated = result.unseated_remaining,
            "Allocation pass complete"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::model::{Examinee, NewBatch, Room};
    use seatplan_id::{DeptCode, RegisterNo, RoomCode};

    fn seeded(rooms: &[(&str, u32)]) -> (Allocator<MemoryStore>, BatchId) {
        let store = MemoryStore::new();
        let batch = store.create_batch(NewBatch::default()).unwrap().id;
        for dept in ["UAM", "UCS"] {
            for i in 101..=104 {
                store
                    .upsert_examinee(
                        batch,
                        Examinee::new(
                            RegisterNo::parse(&format!("24{dept}{i}")).unwrap(),
                            "x",
                            DeptCode::parse(dept).unwrap(),
                        ),
                    )
                    .unwrap();
            }
        }
        for (code, capacity) in rooms {
            store
                .add_room(Room::new(RoomCode::parse(code).unwrap(), *capacity).unwrap())
                .unwrap();
        }
        (Allocator::new(store, PlanConfig::default()).unwrap(), batch)
    }

    #[test]
    fn test_run_pass_commits_placements() {
        let (allocator, batch) = seeded(&[("G01", 5), ("G02", 5)]);
        let result = allocator.run_pass(batch).unwrap();

        assert_eq!(result.placed_count, 8);
        assert!(allocator.store().list_unseated(batch).unwrap().is_empty());
        assert_eq!(allocator.store().seat_map(batch).unwrap().len(), 8);

        // Nothing left to seat on a second pass.
        let again = allocator.run_pass(batch).unwrap();
        assert_eq!(again.placed_count, 0);
    }

    #[test]
    fn test_rooms_visited_in_code_order() {
        let (allocator, batch) = seeded(&[("G02", 4), ("G01", 4)]);
        let result = allocator.run_pass(batch).unwrap();
        assert_eq!(result.rooms[0].room.as_str(), "G01");
        assert_eq!(result.allocations[0].room.as_str(), "G01");
    }

    #[test]
    fn test_ground_floor_fills_before_upper_floors() {
        let (allocator, batch) = seeded(&[("101", 4), ("G02", 4), ("G01", 4)]);
        let result = allocator.run_pass(batch).unwrap();

        let visited: Vec<&str> = result.rooms.iter().map(|r| r.room.as_str()).collect();
        assert_eq!(visited, vec!["G01", "G02", "101"]);
        assert!(result.allocations.iter().all(|a| a.room.as_str() != "101"));
    }

    #[test]
    fn test_refresh_without_rooms_keeps_seats() {
        let (allocator, batch) = seeded(&[("G01", 8)]);
        allocator.run_pass(batch).unwrap();
        allocator
            .store()
            .toggle_room(&RoomCode::parse("G01").unwrap())
            .unwrap();

        let err = allocator.refresh(batch).unwrap_err();
        assert!(matches!(err, AllocationError::NoRoomsAvailable));
        assert_eq!(allocator.store().seat_map(batch).unwrap().len(), 8);
    }

    #[test]
    fn test_refresh_reproduces_seat_map() {
        let (allocator, batch) = seeded(&[("G01", 3), ("G02", 3), ("G03", 3)]);
        let first = allocator.run_pass(batch).unwrap();

        let refreshed = allocator.refresh(batch).unwrap();
        assert_eq!(refreshed.reset_count, 8);
        assert_eq!(refreshed.result.allocations, first.allocations);
        assert_eq!(refreshed.result.fingerprint(), first.fingerprint());
    }

    #[test]
    fn test_later_pass_fills_around_existing_seats() {
        let (allocator, batch) = seeded(&[("G01", 5), ("G02", 5)]);
        allocator.run_pass(batch).unwrap();

        allocator
            .store()
            .upsert_examinee(
                batch,
                Examinee::new(
                    RegisterNo::parse("24UAM105").unwrap(),
                    "x",
                    DeptCode::parse("UAM").unwrap(),
                ),
            )
            .unwrap();
        let second = allocator.run_pass(batch).unwrap();
        assert_eq!(second.placed_count, 1);

        let seats: std::collections::HashSet<_> = allocator
            .store()
            .seat_map(batch)
            .unwrap()
            .into_iter()
            .map(|a| (a.room, a.seat))
            .collect();
        assert_eq!(seats.len(), 9);
    }

    #[test]
    fn test_unknown_batch_is_store_error() {
        let (allocator, _) = seeded(&[("G01", 3)]);
        let err = allocator.run_pass(BatchId::new()).unwrap_err();
        assert!(matches!(err, AllocationError::Store(e) if e.is_not_found()));
    }

    #[test]
    fn test_concurrent_passes_never_double_seat() {
        let (allocator, batch) = seeded(&[("G01", 4), ("G02", 4)]);
        let allocator = Arc::new(allocator);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let allocator = Arc::clone(&allocator);
                std::thread::spawn(move || allocator.run_pass(batch).unwrap().placed_count)
            })
            .collect();
        let placed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(placed, 8);
        assert_eq!(allocator.store().seat_map(batch).unwrap().len(), 8);
        assert_eq!(allocator.locks.active(), 0);
    }

    #[test]
    fn test_batch_locks_released_after_use() {
        let (allocator, batch) = seeded(&[("G01", 4), ("G02", 4)]);
        allocator.run_pass(batch).unwrap();
        allocator.refresh(batch).unwrap();
        allocator.run_pass(BatchId::new()).unwrap_err();
        assert_eq!(allocator.locks.active(), 0);
    }

    #[test]
    fn test_batch_lock_kept_while_held() {
        let locks = Arc::new(BatchLocks::new());
        let batch = BatchId::new();
        let (entered, release) = (std::sync::mpsc::channel(), std::sync::mpsc::channel::<()>());

        let holder = {
            let locks = Arc::clone(&locks);
            let (entered, release) = (entered.0, release.1);
            std::thread::spawn(move || {
                locks.with_batch(batch, || {
                    entered.send(()).unwrap();
                    release.recv().unwrap();
                })
            })
        };
        entered.1.recv().unwrap();
        assert_eq!(locks.active(), 1);

        release.0.send(()).unwrap();
        holder.join().unwrap();
        assert_eq!(locks.active(), 0);
        assert_eq!(locks.with_batch(batch, || 7), 7);
        assert_eq!(locks.active(), 0);
    }
}
