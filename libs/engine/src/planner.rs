//! Per-room department selection and fill ordering.

use std::collections::HashSet;

use seatplan_id::DeptCode;
use serde::{Deserialize, Serialize};

use crate::error::{AllocationError, EngineResult};
use crate::grouper::{interleave, DepartmentGroups};

/// Default ceiling on departments sharing one room.
pub const DEFAULT_MAX_DEPARTMENTS_PER_ROOM: usize = 3;

/// Planner tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Most departments the rotation may place in a single room.
    #[serde(default = "default_max_departments")]
    pub max_departments_per_room: usize,
}

fn default_max_departments() -> usize {
    DEFAULT_MAX_DEPARTMENTS_PER_ROOM
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            max_departments_per_room: DEFAULT_MAX_DEPARTMENTS_PER_ROOM,
        }
    }
}

impl PlanConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_departments_per_room == 0 {
            return Err(AllocationError::InvalidConfig(
                "max_departments_per_room must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Examinees already seated during the current pass.
///
/// Holds indices into the pass's examinee slice and lives only as long as
/// the pass that owns it.
#[derive(Debug, Default)]
pub struct AllocatedSet {
    seated: HashSet<usize>,
}

impl AllocatedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an examinee as seated. Returns false if it already was.
    pub fn insert(&mut self, idx: usize) -> bool {
        self.seated.insert(idx)
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.seated.contains(&idx)
    }

    pub fn len(&self) -> usize {
        self.seated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seated.is_empty()
    }
}

/// Where the next room's department selection starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationCursor {
    offset: usize,
}

impl RotationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Select the departments for the next room and advance.
    ///
    /// Takes `min(max_per_room, departments.len())` consecutive codes starting
    /// at the cursor, wrapping around the list, then moves the cursor past
    /// them. The returned codes are in ascending order.
    pub fn select(&mut self, departments: &[DeptCode], max_per_room: usize) -> Vec<DeptCode> {
        let count = departments.len();
        if count == 0 {
            return Vec::new();
        }

        let take = max_per_room.min(count);
        let mut selected: Vec<DeptCode> = (0..take)
            .map(|i| departments[(self.offset + i) % count].clone())
            .collect();
        self.offset = (self.offset + take) % count;

        selected.sort();
        selected
    }
}

/// Build a room's fill order from the selected departments.
///
/// Each department contributes its members not yet in `allocated`, in roll
/// order; the contributions are interleaved round-robin in the order of
/// `selected` (ascending department code).
pub fn fill_order(
    groups: &DepartmentGroups,
    selected: &[DeptCode],
    allocated: &AllocatedSet,
) -> Vec<usize> {
    let remaining: Vec<Vec<usize>> = selected
        .iter()
        .map(|dept| {
            groups
                .members(dept)
                .iter()
                .copied()
                .filter(|&idx| !allocated.contains(idx))
                .collect()
        })
        .collect();

    let sequences: Vec<&[usize]> = remaining.iter().map(Vec::as_slice).collect();
    interleave(&sequences)
}
