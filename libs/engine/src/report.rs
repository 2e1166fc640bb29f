//! Batch status reporting.

use std::collections::BTreeMap;

use seatplan_id::{BatchId, DeptCode};
use serde::Serialize;

use crate::memory::MemoryStore;
use crate::model::Batch;
use crate::store::StoreResult;

/// Seated/unseated totals for one department.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DepartmentStatus {
    pub total: usize,
    pub seated: usize,
    pub unseated: usize,
}

/// Snapshot of a batch against the current room list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub batch: Batch,
    pub total: usize,
    pub seated: usize,
    pub unseated: usize,
    pub departments: BTreeMap<DeptCode, DepartmentStatus>,
    pub rooms_total: usize,
    pub rooms_available: usize,
    /// Summed capacity of available rooms.
    pub available_capacity: u64,
}

impl StatusReport {
    /// Seats missing for the current unseated examinees, if any.
    ///
    /// Compares against the whole available capacity, which is what a
    /// refresh would have to work with.
    pub fn shortfall(&self) -> u64 {
        (self.total as u64).saturating_sub(self.available_capacity)
    }
}

/// Build a [`StatusReport`] for a batch.
pub fn status(store: &MemoryStore, batch_id: BatchId) -> StoreResult<StatusReport> {
    let batch = store.batch(batch_id)?;
    let examinees = store.examinees(batch_id)?;
    let rooms = store.rooms();

    let mut departments: BTreeMap<DeptCode, DepartmentStatus> = BTreeMap::new();
    for examinee in &examinees {
        let entry = departments.entry(examinee.dept.clone()).or_default();
        entry.total += 1;
        if examinee.is_seated() {
            entry.seated += 1;
        } else {
            entry.unseated += 1;
        }
    }

    let seated = examinees.iter().filter(|e| e.is_seated()).count();
    let available: Vec<_> = rooms.iter().filter(|r| r.available).collect();

    Ok(StatusReport {
        batch,
        total: examinees.len(),
        seated,
        unseated: examinees.len() - seated,
        departments,
        rooms_total: rooms.len(),
        rooms_available: available.len(),
        available_capacity: available.iter().map(|r| u64::from(r.capacity())).sum(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Examinee, NewBatch, Room};
    use crate::store::SeatingStore;
    use seatplan_id::{RegisterNo, RoomCode};

    #[test]
    fn test_status_counts_and_shortfall() {
        let store = MemoryStore::new();
        let batch = store.create_batch(NewBatch::default()).unwrap().id;
        for (reg, dept) in [("24UAM101", "UAM"), ("24UAM102", "UAM"), ("24UCS101", "UCS")] {
            store
                .upsert_examinee(
                    batch,
                    Examinee::new(
                        RegisterNo::parse(reg).unwrap(),
                        "x",
                        DeptCode::parse(dept).unwrap(),
                    ),
                )
                .unwrap();
        }
        store
            .add_room(Room::new(RoomCode::parse("G01").unwrap(), 2).unwrap())
            .unwrap();
        store
            .add_room(Room::new(RoomCode::parse("G02").unwrap(), 30).unwrap().unavailable())
            .unwrap();
        store
            .commit_placement(
                batch,
                &RegisterNo::parse("24UAM101").unwrap(),
                &RoomCode::parse("G01").unwrap(),
                1,
            )
            .unwrap();

        let report = status(&store, batch).unwrap();
        assert_eq!((report.total, report.seated, report.unseated), (3, 1, 2));
        assert_eq!(report.rooms_total, 2);
        assert_eq!(report.rooms_available, 1);
        assert_eq!(report.available_capacity, 2);
        assert_eq!(report.shortfall(), 1);

        let uam = &report.departments[&DeptCode::parse("UAM").unwrap()];
        assert_eq!((uam.total, uam.seated, uam.unseated), (2, 1, 1));
    }

    #[test]
    fn test_status_unknown_batch() {
        let store = MemoryStore::new();
        assert!(status(&store, BatchId::new()).unwrap_err().is_not_found());
    }
}
