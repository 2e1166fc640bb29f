//! In-memory [`SeatingStore`] with batch and room management.
//!
//! The whole state is serde-serializable so a caller can persist it as a
//! single document (the CLI keeps it in a JSON state file).

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use seatplan_id::{BatchId, RegisterNo, RoomCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::model::{sort_rooms, Allocation, Batch, Examinee, NewBatch, Placement, Room};
use crate::store::{SeatingStore, StoreResult};

/// A batch together with its examinees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub batch: Batch,
    #[serde(default)]
    pub examinees: BTreeMap<RegisterNo, Examinee>,
}

/// Serializable store contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub batches: BTreeMap<BatchId, BatchEntry>,
    #[serde(default)]
    pub rooms: BTreeMap<RoomCode, Room>,
}

/// Batch listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    #[serde(flatten)]
    pub batch: Batch,
    pub record_count: usize,
}

/// Outcome of an examinee upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

/// Outcome of reconciling an inferred room with the room list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomChange {
    Created,
    Grown,
    Unchanged,
}

/// In-memory store guarded by a read/write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: StoreState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> StoreState {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Batches
    // =========================================================================

    /// Create a batch, generating a name from the exam type and current time
    /// when none is given. Names are unique.
    pub fn create_batch(&self, request: NewBatch) -> StoreResult<Batch> {
        let created_at = Utc::now();
        let name = request
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| NewBatch::generated_name(request.exam_type, created_at));

        let mut state = self.write();
        if state.batches.values().any(|e| e.batch.name == name) {
            return Err(StoreError::DuplicateBatchName(name));
        }

        let batch = Batch {
            id: BatchId::new(),
            name,
            exam_type: request.exam_type,
            description: request.description.filter(|d| !d.trim().is_empty()),
            created_at,
            active: true,
        };

        info!(batch_id = %batch.id, name = %batch.name, exam_type = %batch.exam_type, "Batch created");
        state.batches.insert(
            batch.id,
            BatchEntry {
                batch: batch.clone(),
                examinees: BTreeMap::new(),
            },
        );
        Ok(batch)
    }

    pub fn batch(&self, batch_id: BatchId) -> StoreResult<Batch> {
        self.read()
            .batches
            .get(&batch_id)
            .map(|e| e.batch.clone())
            .ok_or(StoreError::BatchNotFound(batch_id))
    }

    /// All batches, newest first.
    pub fn list_batches(&self) -> Vec<BatchSummary> {
        let state = self.read();
        let mut summaries: Vec<_> = state
            .batches
            .values()
            .map(|e| BatchSummary {
                batch: e.batch.clone(),
                record_count: e.examinees.len(),
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.batch
                .created_at
                .cmp(&a.batch.created_at)
                .then_with(|| b.batch.id.cmp(&a.batch.id))
        });
        summaries
    }

    /// Most recently created batch, if any.
    pub fn latest_batch(&self) -> Option<Batch> {
        self.list_batches().into_iter().next().map(|s| s.batch)
    }

    /// Delete a batch and its examinees. Returns how many examinees went with it.
    pub fn delete_batch(&self, batch_id: BatchId) -> StoreResult<usize> {
        let entry = self
            .write()
            .batches
            .remove(&batch_id)
            .ok_or(StoreError::BatchNotFound(batch_id))?;
        info!(batch_id = %batch_id, removed = entry.examinees.len(), "Batch deleted");
        Ok(entry.examinees.len())
    }

    /// Remove every examinee from a batch, keeping the batch.
    pub fn clear_batch(&self, batch_id: BatchId) -> StoreResult<usize> {
        let mut state = self.write();
        let entry = entry_mut(&mut state, batch_id)?;
        let removed = entry.examinees.len();
        entry.examinees.clear();
        info!(batch_id = %batch_id, removed, "Batch cleared");
        Ok(removed)
    }

    // =========================================================================
    // Examinees
    // =========================================================================

    /// Insert or update an examinee keyed by registration number.
    ///
    /// On update the name, department and course title are replaced. The
    /// placement is replaced only when the incoming record is seated, so
    /// re-importing a roster without seating keeps existing seats.
    pub fn upsert_examinee(&self, batch_id: BatchId, examinee: Examinee) -> StoreResult<Upsert> {
        let mut state = self.write();
        let entry = entry_mut(&mut state, batch_id)?;

        match entry.examinees.get_mut(&examinee.register_no) {
            Some(existing) => {
                existing.name = examinee.name;
                existing.dept = examinee.dept;
                if examinee.course_title.is_some() {
                    existing.course_title = examinee.course_title;
                }
                if examinee.placement.is_seated() {
                    existing.placement = examinee.placement;
                }
                Ok(Upsert::Updated)
            }
            None => {
                entry
                    .examinees
                    .insert(examinee.register_no.clone(), examinee);
                Ok(Upsert::Created)
            }
        }
    }

    /// Every examinee of a batch, ordered by registration number.
    pub fn examinees(&self, batch_id: BatchId) -> StoreResult<Vec<Examinee>> {
        let state = self.read();
        let entry = state
            .batches
            .get(&batch_id)
            .ok_or(StoreError::BatchNotFound(batch_id))?;
        Ok(entry.examinees.values().cloned().collect())
    }

    /// Set an examinee's seat directly (pre-assigned seating import).
    pub fn assign_seat(
        &self,
        batch_id: BatchId,
        register_no: &RegisterNo,
        placement: Placement,
    ) -> StoreResult<()> {
        let mut state = self.write();
        let entry = entry_mut(&mut state, batch_id)?;
        let examinee =
            entry
                .examinees
                .get_mut(register_no)
                .ok_or_else(|| StoreError::ExamineeNotFound {
                    batch_id,
                    register_no: register_no.clone(),
                })?;
        examinee.placement = placement;
        Ok(())
    }

    /// Seated examinees of a batch ordered by room code, then seat number.
    pub fn seat_map(&self, batch_id: BatchId) -> StoreResult<Vec<Allocation>> {
        let state = self.read();
        let entry = state
            .batches
            .get(&batch_id)
            .ok_or(StoreError::BatchNotFound(batch_id))?;

        let mut seats: Vec<Allocation> = entry
            .examinees
            .values()
            .filter_map(|e| match &e.placement {
                Placement::Seated { room, seat } => Some(Allocation {
                    register_no: e.register_no.clone(),
                    room: room.clone(),
                    seat: seat.get(),
                }),
                Placement::Unseated => None,
            })
            .collect();
        seats.sort_by(|a, b| a.room.cmp(&b.room).then(a.seat.cmp(&b.seat)));
        Ok(seats)
    }

    // =========================================================================
    // Rooms
    // =========================================================================

    pub fn add_room(&self, room: Room) -> StoreResult<()> {
        let mut state = self.write();
        if state.rooms.contains_key(&room.code) {
            return Err(StoreError::DuplicateRoom(room.code));
        }
        info!(room = %room.code, capacity = room.capacity(), "Room added");
        state.rooms.insert(room.code.clone(), room);
        Ok(())
    }

    /// Make sure a room seen in imported seating exists and is big enough.
    ///
    /// A missing room is created available with `created_capacity`. An
    /// existing room grows to `max_seat` when that exceeds its capacity.
    pub fn ensure_room(
        &self,
        code: &RoomCode,
        max_seat: u32,
        created_capacity: u32,
    ) -> StoreResult<RoomChange> {
        let mut state = self.write();
        match state.rooms.get_mut(code) {
            Some(room) => match std::num::NonZeroU32::new(max_seat) {
                Some(seat) if seat > room.capacity => {
                    debug!(room = %code, from = room.capacity(), to = max_seat, "Room capacity grown");
                    room.capacity = seat;
                    Ok(RoomChange::Grown)
                }
                _ => Ok(RoomChange::Unchanged),
            },
            None => {
                let room = Room::new(code.clone(), created_capacity.max(max_seat))
                    .map_err(|e| StoreError::Invalid(e.to_string()))?;
                state.rooms.insert(code.clone(), room);
                Ok(RoomChange::Created)
            }
        }
    }

    /// Flip a room's availability. Returns the new availability.
    pub fn toggle_room(&self, code: &RoomCode) -> StoreResult<bool> {
        let mut state = self.write();
        let room = state
            .rooms
            .get_mut(code)
            .ok_or_else(|| StoreError::RoomNotFound(code.clone()))?;
        room.available = !room.available;
        info!(room = %code, available = room.available, "Room toggled");
        Ok(room.available)
    }

    /// Mark every room available. Returns how many rooms changed.
    pub fn enable_all_rooms(&self) -> usize {
        let mut state = self.write();
        let mut changed = 0;
        for room in state.rooms.values_mut().filter(|r| !r.available) {
            room.available = true;
            changed += 1;
        }
        changed
    }

    /// All rooms in planning order.
    pub fn rooms(&self) -> Vec<Room> {
        let mut rooms: Vec<Room> = self.read().rooms.values().cloned().collect();
        sort_rooms(&mut rooms);
        rooms
    }

    pub fn room(&self, code: &RoomCode) -> StoreResult<Room> {
        self.read()
            .rooms
            .get(code)
            .cloned()
            .ok_or_else(|| StoreError::RoomNotFound(code.clone()))
    }
}

fn entry_mut(state: &mut StoreState, batch_id: BatchId) -> StoreResult<&mut BatchEntry> {
    state
        .batches
        .get_mut(&batch_id)
        .ok_or(StoreError::BatchNotFound(batch_id))
}

impl SeatingStore for MemoryStore {
    fn list_unseated(&self, batch_id: BatchId) -> StoreResult<Vec<Examinee>> {
        let state = self.read();
        let entry = state
            .batches
            .get(&batch_id)
            .ok_or(StoreError::BatchNotFound(batch_id))?;
        Ok(entry
            .examinees
            .values()
            .filter(|e| !e.is_seated())
            .cloned()
            .collect())
    }

    fn list_available_rooms(&self) -> StoreResult<Vec<Room>> {
        Ok(self
            .read()
            .rooms
            .values()
            .filter(|r| r.available)
            .cloned()
            .collect())
    }

    fn list_occupied_seats(&self, batch_id: BatchId) -> StoreResult<Vec<Allocation>> {
        self.seat_map(batch_id)
    }

    fn commit_placement(
        &self,
        batch_id: BatchId,
        register_no: &RegisterNo,
        room: &RoomCode,
        seat: u32,
    ) -> StoreResult<()> {
        let placement = Placement::seated(room.clone(), seat)
            .map_err(|e| StoreError::Invalid(e.to_string()))?;
        self.assign_seat(batch_id, register_no, placement)
    }

    fn reset_placements(&self, batch_id: BatchId) -> StoreResult<usize> {
        let mut state = self.write();
        let entry = entry_mut(&mut state, batch_id)?;
        let mut changed = 0;
        for examinee in entry.examinees.values_mut().filter(|e| e.is_seated()) {
            examinee.placement = Placement::Unseated;
            changed += 1;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExamType;
    use seatplan_id::DeptCode;

    fn reg(s: &str) -> RegisterNo {
        RegisterNo::parse(s).unwrap()
    }

    fn room_code(s: &str) -> RoomCode {
        RoomCode::parse(s).unwrap()
    }

    fn examinee(r: &str, dept: &str) -> Examinee {
        Examinee::new(reg(r), "Student", DeptCode::parse(dept).unwrap())
    }

    fn store_with_batch() -> (MemoryStore, BatchId) {
        let store = MemoryStore::new();
        let batch = store
            .create_batch(NewBatch {
                name: Some("Test".to_string()),
                ..Default::default()
            })
            .unwrap();
        (store, batch.id)
    }

    #[test]
    fn test_batch_name_generated_and_unique() {
        let store = MemoryStore::new();
        let batch = store
            .create_batch(NewBatch {
                exam_type: ExamType::Arrear,
                ..Default::default()
            })
            .unwrap();
        assert!(batch.name.starts_with("Arrear - "));

        let dup = store.create_batch(NewBatch {
            name: Some(batch.name.clone()),
            ..Default::default()
        });
        assert!(matches!(dup, Err(StoreError::DuplicateBatchName(_))));
    }

    #[test]
    fn test_upsert_keeps_seat_on_unseated_update() {
        let (store, batch) = store_with_batch();
        assert_eq!(
            store.upsert_examinee(batch, examinee("24UAM101", "UAM")).unwrap(),
            Upsert::Created
        );
        store
            .commit_placement(batch, &reg("24UAM101"), &room_code("G01"), 7)
            .unwrap();

        let renamed = Examinee::new(reg("24UAM101"), "Renamed", DeptCode::parse("UAM").unwrap());
        assert_eq!(store.upsert_examinee(batch, renamed).unwrap(), Upsert::Updated);

        let stored = &store.examinees(batch).unwrap()[0];
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.placement.seat(), Some(7));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let (store, batch) = store_with_batch();
        store.upsert_examinee(batch, examinee("24UAM101", "UAM")).unwrap();
        store.upsert_examinee(batch, examinee("24UAM102", "UAM")).unwrap();
        store
            .commit_placement(batch, &reg("24UAM101"), &room_code("G01"), 1)
            .unwrap();

        assert_eq!(store.reset_placements(batch).unwrap(), 1);
        assert_eq!(store.reset_placements(batch).unwrap(), 0);
        assert_eq!(store.list_unseated(batch).unwrap().len(), 2);
    }

    #[test]
    fn test_commit_unknown_examinee() {
        let (store, batch) = store_with_batch();
        let err = store
            .commit_placement(batch, &reg("24UAM999"), &room_code("G01"), 1)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_seat_map_ordered_by_room_then_seat() {
        let (store, batch) = store_with_batch();
        for r in ["24UAM101", "24UAM102", "24UAM103"] {
            store.upsert_examinee(batch, examinee(r, "UAM")).unwrap();
        }
        store
            .commit_placement(batch, &reg("24UAM101"), &room_code("G02"), 1)
            .unwrap();
        store
            .commit_placement(batch, &reg("24UAM102"), &room_code("G01"), 2)
            .unwrap();
        store
            .commit_placement(batch, &reg("24UAM103"), &room_code("G01"), 1)
            .unwrap();

        let map: Vec<_> = store
            .seat_map(batch)
            .unwrap()
            .into_iter()
            .map(|a| (a.room.to_string(), a.seat))
            .collect();
        assert_eq!(
            map,
            vec![
                ("G01".to_string(), 1),
                ("G01".to_string(), 2),
                ("G02".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_rooms_toggle_and_ensure() {
        let store = MemoryStore::new();
        store.add_room(Room::new(room_code("G01"), 30).unwrap()).unwrap();
        assert!(matches!(
            store.add_room(Room::new(room_code("G01"), 10).unwrap()),
            Err(StoreError::DuplicateRoom(_))
        ));

        assert!(!store.toggle_room(&room_code("G01")).unwrap());
        assert!(store.list_available_rooms().unwrap().is_empty());
        assert_eq!(store.enable_all_rooms(), 1);

        assert_eq!(
            store.ensure_room(&room_code("G01"), 12, 30).unwrap(),
            RoomChange::Unchanged
        );
        assert_eq!(
            store.ensure_room(&room_code("G01"), 42, 30).unwrap(),
            RoomChange::Grown
        );
        assert_eq!(store.room(&room_code("G01")).unwrap().capacity(), 42);

        assert_eq!(
            store.ensure_room(&room_code("H1"), 12, 30).unwrap(),
            RoomChange::Created
        );
        assert_eq!(store.room(&room_code("H1")).unwrap().capacity(), 30);
    }

    #[test]
    fn test_state_roundtrips_through_json() {
        let (store, batch) = store_with_batch();
        store.upsert_examinee(batch, examinee("24UAM101", "UAM")).unwrap();
        store.add_room(Room::new(room_code("G01"), 30).unwrap()).unwrap();

        let json = serde_json::to_string(&store.snapshot()).unwrap();
        let restored: StoreState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, store.snapshot());
    }

    #[test]
    fn test_delete_and_clear_batch() {
        let (store, batch) = store_with_batch();
        store.upsert_examinee(batch, examinee("24UAM101", "UAM")).unwrap();

        assert_eq!(store.clear_batch(batch).unwrap(), 1);
        assert_eq!(store.delete_batch(batch).unwrap(), 0);
        assert!(matches!(
            store.batch(batch),
            Err(StoreError::BatchNotFound(_))
        ));
    }
}
