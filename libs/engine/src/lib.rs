//! # seatplan-engine
//!
//! Exam seat allocation for a batch of examinees across a list of rooms.
//!
//! A pass runs in four steps:
//! 1. **Group**: examinees are bucketed by department, each bucket sorted by
//!    the numeric roll suffix of the registration number
//! 2. **Rotate**: each room takes the next `k` departments from a wrapping
//!    cursor, `k = min(max_departments_per_room, department count)`
//! 3. **Interleave**: the selected departments' remaining examinees are
//!    merged round-robin into the room's fill order
//! 4. **Fill**: seats `1..=capacity` are assigned from the head of the order
//!
//! The pure pass lives in [`plan_pass`]. [`Allocator`] wraps it with a
//! [`SeatingStore`], committing placements and serializing work per batch.
//! Seats already held in the batch (pre-assigned seating, earlier passes)
//! are skipped rather than handed out again.
//!
//! ## Example
//!
//! ```
//! use seatplan_engine::{Allocator, Examinee, MemoryStore, NewBatch, PlanConfig, Room};
//! use seatplan_id::{DeptCode, RegisterNo, RoomCode};
//!
//! let store = MemoryStore::new();
//! let batch = store.create_batch(NewBatch::default()).unwrap();
//! store
//!     .upsert_examinee(
//!         batch.id,
//!         Examinee::new(
//!             RegisterNo::parse("24UAM101").unwrap(),
//!             "Asha",
//!             DeptCode::parse("UAM").unwrap(),
//!         ),
//!     )
//!     .unwrap();
//! store
//!     .add_room(Room::new(RoomCode::parse("G01").unwrap(), 30).unwrap())
//!     .unwrap();
//!
//! let allocator = Allocator::new(store, PlanConfig::default()).unwrap();
//! let result = allocator.run_pass(batch.id).unwrap();
//! assert_eq!(result.placed_count, 1);
//! assert_eq!(result.allocations[0].seat, 1);
//! ```

mod allocator;
mod error;
mod filler;
mod grouper;
mod memory;
mod model;
mod pass;
mod planner;
mod report;
mod store;

pub use allocator::{Allocator, BatchLocks, RefreshOutcome};
pub use error::{AllocationError, EngineResult, ModelError, StoreError};
pub use filler::{fill_room, OccupiedSeats};
pub use grouper::{interleave, interleave_all, roll_number, DepartmentGroups};
pub use memory::{BatchEntry, BatchSummary, MemoryStore, RoomChange, StoreState, Upsert};
pub use model::{
    sort_rooms, Allocation, AllocationResult, Batch, ExamType, Examinee, NewBatch, Placement, Room,
    RoomFill,
};
pub use pass::{plan_pass, plan_pass_around};
pub use planner::{
    fill_order, AllocatedSet, PlanConfig, RotationCursor, DEFAULT_MAX_DEPARTMENTS_PER_ROOM,
};
pub use report::{status, DepartmentStatus, StatusReport};
pub use store::{SeatingStore, StoreResult};
