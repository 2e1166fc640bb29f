//! Header normalization and column alias matching.

use std::collections::BTreeMap;
use std::fmt;

/// A logical roster column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    RegisterNo,
    Name,
    Dept,
    CourseTitle,
    Hall,
    Seat,
}

impl Field {
    /// Normalized header names accepted for this field, in priority order.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::RegisterNo => &["register_no", "reg_no", "regno", "roll_no", "rollno"],
            Self::Name => &["student_name", "name", "studentname"],
            Self::Dept => &["course_code", "coursecode", "code", "dept", "department"],
            Self::CourseTitle => &["course_title", "coursetitle", "title", "course_name"],
            Self::Hall => &[
                "exam_hall_number",
                "examhallnumber",
                "hall_number",
                "hall_no",
                "exam_hall",
                "hall",
            ],
            Self::Seat => &[
                "exam_seat_number",
                "examseatnumber",
                "seat_number",
                "seat_no",
                "exam_seat",
                "seat",
            ],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::RegisterNo => "register number",
            Self::Name => "student name",
            Self::Dept => "course code",
            Self::CourseTitle => "course title",
            Self::Hall => "exam hall",
            Self::Seat => "seat number",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalize a header: trim, lowercase, `-` and spaces become `_`.
///
/// `"Register-No"`, `" register no "` and `"REGISTER_NO"` all map to
/// `"register_no"`.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// One roster row keyed by normalized header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: BTreeMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cell, normalizing its header. Later duplicates win.
    pub fn insert(&mut self, header: &str, value: impl Into<String>) {
        self.cells.insert(normalize_header(header), value.into());
    }

    /// First non-blank value among the field's aliases, trimmed.
    pub fn get(&self, field: Field) -> Option<&str> {
        field
            .aliases()
            .iter()
            .filter_map(|alias| self.cells.get(*alias))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }

    /// Like [`Row::get`], treating the placeholder `pending` as absent.
    pub fn get_assigned(&self, field: Field) -> Option<&str> {
        self.get(field).filter(|v| !v.eq_ignore_ascii_case("pending"))
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.trim().is_empty())
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (header, value) in iter {
            row.insert(header.as_ref(), value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Register-No", "register_no")]
    #[case(" Register No ", "register_no")]
    #[case("REGNO", "regno")]
    #[case("Exam Hall Number", "exam_hall_number")]
    #[case("ExamSeatNumber", "examseatnumber")]
    fn test_normalize_header(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_header(raw), expected);
    }

    #[test]
    fn test_alias_priority_and_blank_skip() {
        let row: Row = [("Reg No", "  "), ("Roll No", "24uam101"), ("Register-No", "")]
            .into_iter()
            .collect();
        assert_eq!(row.get(Field::RegisterNo), Some("24uam101"));
        assert_eq!(row.get(Field::Name), None);
    }

    #[test]
    fn test_pending_is_unassigned() {
        let row: Row = [("Hall", "Pending"), ("Seat", "12")].into_iter().collect();
        assert_eq!(row.get(Field::Hall), Some("Pending"));
        assert_eq!(row.get_assigned(Field::Hall), None);
        assert_eq!(row.get_assigned(Field::Seat), Some("12"));
    }

    #[test]
    fn test_blank_row() {
        let row: Row = [("Name", " "), ("Code", "")].into_iter().collect();
        assert!(row.is_blank());
    }
}
