//! Seat filling for a single room.

use std::collections::{BTreeSet, HashMap};

use seatplan_id::RoomCode;

use crate::model::{Allocation, Examinee, Room};
use crate::planner::AllocatedSet;

/// Seats already held before the pass starts, e.g. imported pre-assigned
/// seating or placements from an earlier pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupiedSeats {
    by_room: HashMap<RoomCode, BTreeSet<u32>>,
}

impl OccupiedSeats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, room: RoomCode, seat: u32) -> bool {
        self.by_room.entry(room).or_default().insert(seat)
    }

    pub fn is_taken(&self, room: &RoomCode, seat: u32) -> bool {
        self.by_room
            .get(room)
            .is_some_and(|seats| seats.contains(&seat))
    }

    /// Seats taken in `room` that lie within its capacity.
    pub fn taken_within(&self, room: &Room) -> u32 {
        self.by_room.get(&room.code).map_or(0, |seats| {
            seats.range(1..=room.capacity()).count() as u32
        })
    }

    pub fn is_empty(&self) -> bool {
        self.by_room.values().all(BTreeSet::is_empty)
    }
}

impl FromIterator<(RoomCode, u32)> for OccupiedSeats {
    fn from_iter<I: IntoIterator<Item = (RoomCode, u32)>>(iter: I) -> Self {
        let mut occupied = Self::new();
        for (room, seat) in iter {
            occupied.insert(room, seat);
        }
        occupied
    }
}

/// Assign free seats of `room`, lowest first, to the head of `fill_order`.
///
/// Seats run `1..=capacity`, skipping any in `occupied`. Stops at whichever
/// runs out first, free seats or fill order. Every seated examinee is added
/// to `allocated` and reported in `out`. Returns the number of seats filled.
pub fn fill_room(
    room: &Room,
    fill_order: &[usize],
    examinees: &[Examinee],
    occupied: &OccupiedSeats,
    allocated: &mut AllocatedSet,
    out: &mut Vec<Allocation>,
) -> u32 {
    let mut free_seats =
        (1..=room.capacity()).filter(|seat| !occupied.is_taken(&room.code, *seat));
    let mut filled = 0u32;

    for &idx in fill_order {
        if allocated.contains(idx) {
            continue;
        }
        let Some(seat) = free_seats.next() else {
            break;
        };

        allocated.insert(idx);
        filled += 1;
        out.push(Allocation {
            register_no: examinees[idx].register_no.clone(),
            room: room.code.clone(),
            seat,
        });
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatplan_id::{DeptCode, RegisterNo, RoomCode};

    fn pool(n: usize) -> Vec<Examinee> {
        (1..=n)
            .map(|i| {
                Examinee::new(
                    RegisterNo::parse(&format!("24UAM{i:03}")).unwrap(),
                    "x",
                    DeptCode::parse("UAM").unwrap(),
                )
            })
            .collect()
    }

    fn fill(
        room: &Room,
        order: &[usize],
        examinees: &[Examinee],
        occupied: &OccupiedSeats,
        allocated: &mut AllocatedSet,
    ) -> Vec<(String, u32)> {
        let mut out = Vec::new();
        let filled = fill_room(room, order, examinees, occupied, allocated, &mut out);
        assert_eq!(filled as usize, out.len());
        out.into_iter()
            .map(|a| (a.register_no.to_string(), a.seat))
            .collect()
    }

    fn seat(reg: &str, seat: u32) -> (String, u32) {
        (reg.to_string(), seat)
    }

    #[test]
    fn test_fill_stops_at_capacity() {
        let examinees = pool(5);
        let room = Room::new(RoomCode::parse("G01").unwrap(), 3).unwrap();
        let mut allocated = AllocatedSet::new();

        let seats = fill(
            &room,
            &[4, 3, 2, 1, 0],
            &examinees,
            &OccupiedSeats::new(),
            &mut allocated,
        );

        assert_eq!(
            seats,
            vec![seat("24UAM005", 1), seat("24UAM004", 2), seat("24UAM003", 3)]
        );
        assert_eq!(allocated.len(), 3);
    }

    #[test]
    fn test_fill_stops_when_order_exhausted() {
        let examinees = pool(2);
        let room = Room::new(RoomCode::parse("G02").unwrap(), 30).unwrap();
        let none = OccupiedSeats::new();
        let mut allocated = AllocatedSet::new();

        assert_eq!(fill(&room, &[0, 1], &examinees, &none, &mut allocated).len(), 2);
        assert!(fill(&room, &[], &examinees, &none, &mut allocated).is_empty());
    }

    #[test]
    fn test_fill_never_seats_twice() {
        let examinees = pool(2);
        let room = Room::new(RoomCode::parse("G03").unwrap(), 5).unwrap();
        let mut allocated = AllocatedSet::new();
        allocated.insert(0);

        let seats = fill(
            &room,
            &[0, 1, 1],
            &examinees,
            &OccupiedSeats::new(),
            &mut allocated,
        );
        assert_eq!(seats, vec![seat("24UAM002", 1)]);
    }

    #[test]
    fn test_fill_skips_occupied_seats() {
        let examinees = pool(4);
        let room = Room::new(RoomCode::parse("G04").unwrap(), 4).unwrap();
        let occupied: OccupiedSeats = [
            (RoomCode::parse("G04").unwrap(), 1),
            (RoomCode::parse("G04").unwrap(), 3),
            (RoomCode::parse("G05").unwrap(), 2),
        ]
        .into_iter()
        .collect();
        assert_eq!(occupied.taken_within(&room), 2);

        let mut allocated = AllocatedSet::new();
        let seats = fill(&room, &[0, 1, 2, 3], &examinees, &occupied, &mut allocated);
        assert_eq!(seats, vec![seat("24UAM001", 2), seat("24UAM002", 4)]);
    }
}
