//! Examinees, rooms, batches and allocation reports.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use seatplan_id::{BatchId, DeptCode, RegisterNo, RoomCode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ModelError;

// =============================================================================
// Examinees
// =============================================================================

/// Where an examinee currently sits.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Placement {
    /// Not yet assigned to any room.
    #[default]
    Unseated,

    /// Assigned to a concrete seat.
    Seated { room: RoomCode, seat: NonZeroU32 },
}

impl Placement {
    /// Build a seated placement, rejecting seat 0.
    pub fn seated(room: RoomCode, seat: u32) -> Result<Self, ModelError> {
        let seat = NonZeroU32::new(seat).ok_or(ModelError::ZeroSeat)?;
        Ok(Self::Seated { room, seat })
    }

    pub fn is_seated(&self) -> bool {
        matches!(self, Self::Seated { .. })
    }

    /// Room code, if seated.
    pub fn room(&self) -> Option<&RoomCode> {
        match self {
            Self::Seated { room, .. } => Some(room),
            Self::Unseated => None,
        }
    }

    /// Seat number, if seated.
    pub fn seat(&self) -> Option<u32> {
        match self {
            Self::Seated { seat, .. } => Some(seat.get()),
            Self::Unseated => None,
        }
    }
}

/// A person to be seated for an exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Examinee {
    pub register_no: RegisterNo,
    pub name: String,
    pub dept: DeptCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_title: Option<String>,
    #[serde(default)]
    pub placement: Placement,
}

impl Examinee {
    /// Create an unseated examinee.
    pub fn new(register_no: RegisterNo, name: impl Into<String>, dept: DeptCode) -> Self {
        Self {
            register_no,
            name: name.into(),
            dept,
            course_title: None,
            placement: Placement::Unseated,
        }
    }

    pub fn with_course_title(mut self, title: impl Into<String>) -> Self {
        self.course_title = Some(title.into());
        self
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn is_seated(&self) -> bool {
        self.placement.is_seated()
    }
}

// =============================================================================
// Rooms
// =============================================================================

/// An exam room. Capacity is a hard ceiling on assigned seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub code: RoomCode,
    pub capacity: NonZeroU32,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Room {
    /// Create an available room.
    pub fn new(code: RoomCode, capacity: u32) -> Result<Self, ModelError> {
        let Some(capacity) = NonZeroU32::new(capacity) else {
            return Err(ModelError::ZeroCapacity(code));
        };
        Ok(Self {
            code,
            capacity,
            available: true,
        })
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn capacity(&self) -> u32 {
        self.capacity.get()
    }

    /// Sort key for planning and listing: ground floor rooms (`G01`) first,
    /// then numbered floors (`101`), then any other label, each group by code.
    pub fn planning_key(&self) -> (u8, &str) {
        let code = self.code.as_str();
        let mut chars = code.chars();
        let floor = match (chars.next(), chars.next()) {
            (Some('G' | 'g'), Some(next)) if next.is_ascii_digit() => 0,
            (Some(first), _) if first.is_ascii_digit() => 1,
            _ => 2,
        };
        (floor, code)
    }
}

/// Put rooms in planning order, see [`Room::planning_key`].
pub fn sort_rooms(rooms: &mut [Room]) {
    rooms.sort_by(|a, b| a.planning_key().cmp(&b.planning_key()));
}

// =============================================================================
// Batches
// =============================================================================

/// Kind of exam sitting a batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamType {
    #[default]
    EndSemester,
    Arrear,
    Internal,
}

impl ExamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EndSemester => "end_semester",
            Self::Arrear => "arrear",
            Self::Internal => "internal",
        }
    }

    /// Human-readable label used in generated batch names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::EndSemester => "End Semester",
            Self::Arrear => "Arrear",
            Self::Internal => "Internal",
        }
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "end_semester" => Ok(Self::EndSemester),
            "arrear" => Ok(Self::Arrear),
            "internal" => Ok(Self::Internal),
            other => Err(ModelError::UnknownExamType(other.to_string())),
        }
    }
}

/// A dataset of examinees for one exam sitting. Passes, resets and
/// refreshes are all scoped to a single batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub name: String,
    pub exam_type: ExamType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_available")]
    pub active: bool,
}

/// Request to create a batch.
#[derive(Debug, Clone, Default)]
pub struct NewBatch {
    /// Explicit name; generated from exam type and timestamp when absent.
    pub name: Option<String>,
    pub exam_type: ExamType,
    pub description: Option<String>,
}

impl NewBatch {
    /// Name used when the caller does not supply one, e.g.
    /// `"End Semester - 2025-12-07 09:30"`.
    pub fn generated_name(exam_type: ExamType, at: DateTime<Utc>) -> String {
        format!("{} - {}", exam_type.label(), at.format("%Y-%m-%d %H:%M"))
    }
}

// =============================================================================
// Allocation reports
// =============================================================================

/// One seat assignment produced by a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub register_no: RegisterNo,
    pub room: RoomCode,
    pub seat: u32,
}

/// Per-room outcome of a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomFill {
    pub room: RoomCode,
    /// Departments selected for the room by the rotation, ascending.
    pub departments: Vec<DeptCode>,
    pub seats_filled: u32,
    pub capacity: u32,
}

/// Report of a single allocation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub placed_count: usize,
    /// Examinees considered by the pass that remain unseated.
    pub unseated_remaining: usize,
    /// Assignments in the order they were made.
    pub allocations: Vec<Allocation>,
    /// One entry per room visited, in room order.
    pub rooms: Vec<RoomFill>,
}

impl AllocationResult {
    /// Total examinees the pass considered.
    pub fn considered(&self) -> usize {
        self.placed_count + self.unseated_remaining
    }

    /// Stable digest of the ordered allocation tuples.
    ///
    /// Two passes over identical snapshots produce the same fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for allocation in &self.allocations {
            hasher.update(allocation.register_no.as_str().as_bytes());
            hasher.update([0x1f]);
            hasher.update(allocation.room.as_str().as_bytes());
            hasher.update([0x1f]);
            hasher.update(allocation.seat.to_be_bytes());
            hasher.update([0x1e]);
        }
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }
}
