//! Department grouping and roll-number ordering.
//!
//! Examinees are partitioned by department code. Each partition is ordered by
//! the roll number embedded in the tail of the registration number, so
//! `24UAM101, 24UAM102, ...` keep their natural sequence inside a department.

use std::collections::BTreeMap;

use seatplan_id::{DeptCode, RegisterNo};
use tracing::debug;

use crate::model::Examinee;

/// Number of trailing characters of a registration number that hold the roll.
const ROLL_SUFFIX_LEN: usize = 3;

/// Extract the roll number from the tail of a registration number.
///
/// Takes the last three characters, keeps only digits and parses them.
/// `"24UAM101"` yields 101 and `"24UAM1A9"` yields 19. A tail without digits
/// yields 0, which sorts the examinee to the front of its department.
pub fn roll_number(register_no: &RegisterNo) -> u32 {
    let code = register_no.as_str();
    let tail_start = code
        .char_indices()
        .rev()
        .nth(ROLL_SUFFIX_LEN - 1)
        .map_or(0, |(idx, _)| idx);

    let digits: String = code[tail_start..]
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    match digits.parse() {
        Ok(roll) => roll,
        Err(_) => {
            debug!(register_no = %register_no, "No roll digits in registration suffix, using 0");
            0
        }
    }
}

/// Examinees of a pass grouped by department.
///
/// Members are stored as indices into the pass's examinee slice. Departments
/// iterate in ascending code order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentGroups {
    groups: BTreeMap<DeptCode, Vec<usize>>,
}

impl DepartmentGroups {
    /// Group and order a snapshot of examinees.
    ///
    /// Ties on roll number fall back to the registration number so the result
    /// never depends on the order the snapshot was fetched in.
    pub fn build(examinees: &[Examinee]) -> Self {
        let mut groups: BTreeMap<DeptCode, Vec<usize>> = BTreeMap::new();
        for (idx, examinee) in examinees.iter().enumerate() {
            groups.entry(examinee.dept.clone()).or_default().push(idx);
        }

        for members in groups.values_mut() {
            members.sort_by_cached_key(|&idx| {
                let register_no = &examinees[idx].register_no;
                (roll_number(register_no), register_no.clone())
            });
        }

        Self { groups }
    }

    /// Department codes in ascending order.
    pub fn departments(&self) -> Vec<DeptCode> {
        self.groups.keys().cloned().collect()
    }

    /// Ordered members of one department.
    pub fn members(&self, dept: &DeptCode) -> &[usize] {
        self.groups.get(dept).map_or(&[], Vec::as_slice)
    }

    pub fn department_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Interleave sequences round-robin: element 0 of each, then element 1 of
/// each, and so on, skipping sequences that have run out.
pub fn interleave<T: Copy>(sequences: &[&[T]]) -> Vec<T> {
    let longest = sequences.iter().map(|s| s.len()).max().unwrap_or(0);
    let total = sequences.iter().map(|s| s.len()).sum();

    let mut out = Vec::with_capacity(total);
    for i in 0..longest {
        for sequence in sequences {
            if let Some(item) = sequence.get(i) {
                out.push(*item);
            }
        }
    }
    out
}

/// Preview ordering across every department, ignoring rooms.
///
/// Produces the alternating pattern `UAM101, UCS101, UPH101, UAM102, ...`
/// over the whole pool.
pub fn interleave_all(examinees: &[Examinee]) -> Vec<&Examinee> {
    let groups = DepartmentGroups::build(examinees);
    let sequences: Vec<&[usize]> = groups.groups.values().map(Vec::as_slice).collect();
    interleave(&sequences)
        .into_iter()
        .map(|idx| &examinees[idx])
        .collect()
}
