//! Pass driver: one allocation run over a snapshot of examinees and rooms.

use tracing::{debug, trace};

use crate::error::{AllocationError, EngineResult};
use crate::filler::{fill_room, OccupiedSeats};
use crate::grouper::DepartmentGroups;
use crate::model::{AllocationResult, Examinee, Room, RoomFill};
use crate::planner::{fill_order, AllocatedSet, PlanConfig, RotationCursor};

/// Plan seats for `examinees` across `rooms`, visiting rooms in the given order.
///
/// The caller is responsible for passing only unseated examinees; the pass
/// does not look at their current placement. Unavailable rooms are skipped.
/// Fails with [`AllocationError::NoRoomsAvailable`] when no room is usable.
/// Running out of seats is not an error: whoever does not fit is counted in
/// [`AllocationResult::unseated_remaining`].
pub fn plan_pass(
    examinees: &[Examinee],
    rooms: &[Room],
    config: &PlanConfig,
) -> EngineResult<AllocationResult> {
    plan_pass_around(examinees, rooms, config, &OccupiedSeats::new())
}

/// Like [`plan_pass`], leaving seats in `occupied` untouched.
///
/// Department rotation is unaffected; each room simply has fewer free seats.
pub fn plan_pass_around(
    examinees: &[Examinee],
    rooms: &[Room],
    config: &PlanConfig,
    occupied: &OccupiedSeats,
) -> EngineResult<AllocationResult> {
    config.validate()?;

    let usable: Vec<&Room> = rooms.iter().filter(|room| room.available).collect();
    if usable.is_empty() {
        return Err(AllocationError::NoRoomsAvailable);
    }

    if examinees.is_empty() {
        return Ok(AllocationResult::default());
    }

    let groups = DepartmentGroups::build(examinees);
    let departments = groups.departments();

    let mut allocated = AllocatedSet::new();
    let mut cursor = RotationCursor::new();
    let mut result = AllocationResult::default();

    for room in usable {
        let selected = cursor.select(&departments, config.max_departments_per_room);
        let order = fill_order(&groups, &selected, &allocated);

        let seats_filled = if order.is_empty() {
            trace!(room = %room.code, "No remaining examinees for selected departments");
            0
        } else {
            fill_room(
                room,
                &order,
                examinees,
                occupied,
                &mut allocated,
                &mut result.allocations,
            )
        };

        debug!(
            room = %room.code,
            departments = ?selected.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
            seats_filled,
            capacity = room.capacity(),
            "Room planned"
        );

        result.rooms.push(RoomFill {
            room: room.code.clone(),
            departments: selected,
            seats_filled,
            capacity: room.capacity(),
        });
    }

    result.placed_count = allocated.len();
    result.unseated_remaining = examinees.len() - allocated.len();

    Ok(result)
}
