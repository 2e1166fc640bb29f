//! Importing examinee rosters and pre-assigned seating into a batch.

use std::collections::BTreeMap;

use seatplan_engine::{Examinee, MemoryStore, Placement, RoomChange, StoreError, Upsert};
use seatplan_id::{BatchId, DeptCode, IdError, RegisterNo, RoomCode};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::columns::{Field, Row};
use crate::error::{RejectReason, RosterResult, RowRejection};

/// Capacity given to rooms first seen in a roster when the roster's seat
/// numbers do not call for more.
pub const DEFAULT_ROOM_CAPACITY: u32 = 30;

// =============================================================================
// Row parsing
// =============================================================================

/// A validated examinee row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamineeRow {
    /// The examinee, seated when the row carried both a hall and a seat.
    pub examinee: Examinee,
    /// Hall named on the row, if any, even when the seat was unusable.
    pub hall: Option<RoomCode>,
}

/// Validate one examinee row.
///
/// Register number, name and course code are required. A hall together with
/// a positive numeric seat becomes a pre-assigned placement; a seat without a
/// hall is ignored and a hall without a usable seat leaves the examinee
/// unseated. A hall that is not a valid room code is dropped; the examinee
/// is still imported, unseated.
pub fn parse_examinee_row(row: &Row) -> Result<ExamineeRow, RejectReason> {
    let register_no = required_code(row, Field::RegisterNo, RegisterNo::parse)?;
    let name = row
        .get(Field::Name)
        .ok_or(RejectReason::MissingField(Field::Name))?;
    let dept = required_code(row, Field::Dept, DeptCode::parse)?;

    let mut examinee = Examinee::new(register_no, name, dept);
    if let Some(title) = row.get(Field::CourseTitle) {
        examinee = examinee.with_course_title(title);
    }

    let hall = row
        .get_assigned(Field::Hall)
        .and_then(|raw| match RoomCode::parse(raw) {
            Ok(hall) => Some(hall),
            Err(error) => {
                debug!(
                    register_no = %examinee.register_no,
                    hall = raw,
                    %error,
                    "Unusable hall dropped"
                );
                None
            }
        });

    if let Some(hall) = &hall {
        if let Some(seat) = row.get_assigned(Field::Seat).and_then(parse_seat) {
            if let Ok(placement) = Placement::seated(hall.clone(), seat) {
                examinee = examinee.with_placement(placement);
            }
        }
    }

    Ok(ExamineeRow { examinee, hall })
}

/// A validated pre-assigned seating row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatingRow {
    pub register_no: RegisterNo,
    pub room: RoomCode,
    pub seat: u32,
}

/// Validate one seating row. All three of register number, hall and seat
/// are required (`pending` counts as missing), and the seat must be a
/// positive integer.
pub fn parse_seating_row(row: &Row) -> Result<SeatingRow, RejectReason> {
    let register_no = required_code(row, Field::RegisterNo, RegisterNo::parse)?;
    let raw_hall = row
        .get_assigned(Field::Hall)
        .ok_or(RejectReason::MissingField(Field::Hall))?;
    let room = RoomCode::parse(raw_hall).map_err(|source| RejectReason::InvalidCode {
        field: Field::Hall,
        source,
    })?;
    let raw_seat = row
        .get_assigned(Field::Seat)
        .ok_or(RejectReason::MissingField(Field::Seat))?;
    let seat =
        parse_seat(raw_seat).ok_or_else(|| RejectReason::InvalidSeat(raw_seat.to_string()))?;

    Ok(SeatingRow {
        register_no,
        room,
        seat,
    })
}

fn required_code<T>(
    row: &Row,
    field: Field,
    parse: impl FnOnce(&str) -> Result<T, IdError>,
) -> Result<T, RejectReason> {
    let raw = row.get(field).ok_or(RejectReason::MissingField(field))?;
    parse(raw).map_err(|source| RejectReason::InvalidCode { field, source })
}

/// Positive integer seat numbers. Spreadsheet exports sometimes render
/// integers as `12.0`, which is accepted.
fn parse_seat(raw: &str) -> Option<u32> {
    let digits = raw.strip_suffix(".0").unwrap_or(raw);
    digits.parse::<u32>().ok().filter(|seat| *seat > 0)
}

// =============================================================================
// Roster import
// =============================================================================

/// Outcome of a roster import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterReport {
    pub created: usize,
    pub updated: usize,
    /// Rows imported with a pre-assigned seat.
    pub preassigned: usize,
    pub rooms_created: Vec<RoomCode>,
    pub rooms_grown: Vec<RoomCode>,
    pub rejected: Vec<RowRejection>,
}

impl RosterReport {
    pub fn imported(&self) -> usize {
        self.created + self.updated
    }
}

/// Upsert every valid row into the batch and infer rooms from its halls.
///
/// Each hall named on an accepted row ends up as a room: new halls are
/// created with `max(highest seat seen, default_capacity)` seats, and an
/// existing room grows when the roster seats someone beyond its capacity.
#[instrument(skip(store, rows), fields(batch_id = %batch_id, rows = rows.len()))]
pub fn import_roster(
    store: &MemoryStore,
    batch_id: BatchId,
    rows: &[Row],
    default_capacity: u32,
) -> RosterResult<RosterReport> {
    // Fail on an unknown batch before looking at any row.
    store.batch(batch_id)?;

    let mut report = RosterReport::default();
    let mut halls: BTreeMap<RoomCode, u32> = BTreeMap::new();

    for (idx, row) in rows.iter().enumerate() {
        let parsed = match parse_examinee_row(row) {
            Ok(parsed) => parsed,
            Err(reason) => {
                debug!(row = idx + 1, %reason, "Roster row rejected");
                report.rejected.push(RowRejection {
                    row: idx + 1,
                    reason,
                });
                continue;
            }
        };

        if let Some(hall) = parsed.hall {
            let seat = parsed.examinee.placement.seat().unwrap_or(0);
            let max_seat = halls.entry(hall).or_insert(0);
            *max_seat = (*max_seat).max(seat);
        }
        if parsed.examinee.is_seated() {
            report.preassigned += 1;
        }

        match store.upsert_examinee(batch_id, parsed.examinee)? {
            Upsert::Created => report.created += 1,
            Upsert::Updated => report.updated += 1,
        }
    }

    for (hall, max_seat) in halls {
        match store.ensure_room(&hall, max_seat, default_capacity)? {
            RoomChange::Created => report.rooms_created.push(hall),
            RoomChange::Grown => report.rooms_grown.push(hall),
            RoomChange::Unchanged => {}
        }
    }

    info!(
        created = report.created,
        updated = report.updated,
        preassigned = report.preassigned,
        rejected = report.rejected.len(),
        rooms_created = report.rooms_created.len(),
        "Roster imported"
    );

    Ok(report)
}

// =============================================================================
// Seating import
// =============================================================================

/// Outcome of a pre-assigned seating import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeatingReport {
    pub updated: usize,
    pub not_found: usize,
    pub rejected: Vec<RowRejection>,
}

/// Apply (register number, hall, seat) rows to examinees already in the
/// batch. Rows naming an unknown register number are counted, not fatal.
#[instrument(skip(store, rows), fields(batch_id = %batch_id, rows = rows.len()))]
pub fn import_seating(
    store: &MemoryStore,
    batch_id: BatchId,
    rows: &[Row],
) -> RosterResult<SeatingReport> {
    store.batch(batch_id)?;

    let mut report = SeatingReport::default();
    for (idx, row) in rows.iter().enumerate() {
        let seating = match parse_seating_row(row) {
            Ok(seating) => seating,
            Err(reason) => {
                debug!(row = idx + 1, %reason, "Seating row rejected");
                report.rejected.push(RowRejection {
                    row: idx + 1,
                    reason,
                });
                continue;
            }
        };

        let placement = Placement::seated(seating.room, seating.seat)
            .map_err(|e| StoreError::Invalid(e.to_string()))?;
        match store.assign_seat(batch_id, &seating.register_no, placement) {
            Ok(()) => report.updated += 1,
            Err(StoreError::ExamineeNotFound { .. }) => {
                debug!(row = idx + 1, register_no = %seating.register_no, "Seating row not in batch");
                report.not_found += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(
        updated = report.updated,
        not_found = report.not_found,
        rejected = report.rejected.len(),
        "Seating imported"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use seatplan_engine::NewBatch;

    fn row(cells: &[(&str, &str)]) -> Row {
        cells.iter().copied().collect()
    }

    fn store_with_batch() -> (MemoryStore, BatchId) {
        let store = MemoryStore::new();
        let batch = store.create_batch(NewBatch::default()).unwrap().id;
        (store, batch)
    }

    #[rstest]
    #[case("12", Some(12))]
    #[case("12.0", Some(12))]
    #[case("0", None)]
    #[case("-3", None)]
    #[case("A1", None)]
    fn test_parse_seat(#[case] raw: &str, #[case] expected: Option<u32>) {
        assert_eq!(parse_seat(raw), expected);
    }

    #[test]
    fn test_parse_examinee_row_normalizes() {
        let parsed = parse_examinee_row(&row(&[
            ("Register-No", " 24uam101 "),
            ("Student Name", "Asha"),
            ("Course Code", "UAM"),
            ("Course Title", "Algebra"),
        ]))
        .unwrap();

        assert_eq!(parsed.examinee.register_no.as_str(), "24UAM101");
        assert_eq!(parsed.examinee.course_title.as_deref(), Some("Algebra"));
        assert!(!parsed.examinee.is_seated());
        assert_eq!(parsed.hall, None);
    }

    #[rstest]
    #[case(&[("Name", "Asha"), ("Code", "UAM")], RejectReason::MissingField(Field::RegisterNo))]
    #[case(&[("Reg No", "24UAM101"), ("Code", "UAM")], RejectReason::MissingField(Field::Name))]
    #[case(&[("Reg No", "24UAM101"), ("Name", "Asha")], RejectReason::MissingField(Field::Dept))]
    fn test_missing_required_fields(#[case] cells: &[(&str, &str)], #[case] expected: RejectReason) {
        assert_eq!(parse_examinee_row(&row(cells)).unwrap_err(), expected);
    }

    #[test]
    fn test_non_alphanumeric_register_rejected() {
        let err = parse_examinee_row(&row(&[
            ("Reg No", "24-UAM-101"),
            ("Name", "Asha"),
            ("Code", "UAM"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            RejectReason::InvalidCode {
                field: Field::RegisterNo,
                ..
            }
        ));
    }

    #[test]
    fn test_hall_and_seat_preassign() {
        let with = |extra: &[(&str, &str)]| {
            let mut cells = row(&[("Reg No", "24UAM101"), ("Name", "Asha"), ("Code", "UAM")]);
            for (header, value) in extra {
                cells.insert(header, *value);
            }
            parse_examinee_row(&cells).unwrap()
        };

        let seated = with(&[("Hall", "H1"), ("Seat", "4")]);
        assert_eq!(seated.examinee.placement.seat(), Some(4));

        let seat_only = with(&[("Seat", "4")]);
        assert!(!seat_only.examinee.is_seated());

        let pending = with(&[("Hall", "Pending"), ("Seat", "Pending")]);
        assert!(!pending.examinee.is_seated());
        assert_eq!(pending.hall, None);

        let hall_only = with(&[("Hall", "H1")]);
        assert!(!hall_only.examinee.is_seated());
        assert_eq!(hall_only.hall.unwrap().as_str(), "H1");
    }

    #[test]
    fn test_import_roster_counts_and_rooms() {
        let (store, batch) = store_with_batch();
        store
            .add_room(seatplan_engine::Room::new(RoomCode::parse("H2").unwrap(), 30).unwrap())
            .unwrap();

        let rows = vec![
            row(&[
                ("Reg No", "24UAM101"),
                ("Name", "A"),
                ("Code", "UAM"),
                ("Hall", "H1"),
                ("Seat", "5"),
            ]),
            row(&[
                ("Reg No", "24UAM102"),
                ("Name", "B"),
                ("Code", "UAM"),
                ("Hall", "H2"),
                ("Seat", "42"),
            ]),
            row(&[("Reg No", "24UCS101"), ("Name", "C"), ("Code", "UCS")]),
            row(&[("Reg No", "24UCS102"), ("Code", "UCS")]),
            row(&[("Reg No", "24uam101"), ("Name", "A2"), ("Code", "UAM")]),
        ];

        let report = import_roster(&store, batch, &rows, DEFAULT_ROOM_CAPACITY).unwrap();
        assert_eq!(report.created, 3);
        assert_eq!(report.updated, 1);
        assert_eq!(report.preassigned, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].row, 4);

        assert_eq!(report.rooms_created, vec![RoomCode::parse("H1").unwrap()]);
        assert_eq!(report.rooms_grown, vec![RoomCode::parse("H2").unwrap()]);
        assert_eq!(store.room(&RoomCode::parse("H1").unwrap()).unwrap().capacity(), 30);
        assert_eq!(store.room(&RoomCode::parse("H2").unwrap()).unwrap().capacity(), 42);

        // The re-imported row without seating keeps its seat.
        let seat_map = store.seat_map(batch).unwrap();
        assert_eq!(seat_map.len(), 2);
        assert!(seat_map
            .iter()
            .any(|a| a.register_no.as_str() == "24UAM101" && a.seat == 5));
    }

    #[test]
    fn test_unusable_hall_keeps_examinee() {
        let parsed = parse_examinee_row(&row(&[
            ("Reg No", "24UAM101"),
            ("Name", "Asha"),
            ("Code", "UAM"),
            ("Hall", "Hall#1"),
            ("Seat", "4"),
        ]))
        .unwrap();

        assert_eq!(parsed.examinee.register_no.as_str(), "24UAM101");
        assert!(!parsed.examinee.is_seated());
        assert_eq!(parsed.hall, None);
    }

    #[rstest]
    #[case(&[("Reg No", "24UAM101"), ("Hall", "Pending"), ("Seat", "3")], RejectReason::MissingField(Field::Hall))]
    #[case(&[("Reg No", "24UAM101"), ("Hall", "G01"), ("Seat", "pending")], RejectReason::MissingField(Field::Seat))]
    fn test_pending_seating_rejected(#[case] cells: &[(&str, &str)], #[case] expected: RejectReason) {
        assert_eq!(parse_seating_row(&row(cells)).unwrap_err(), expected);
    }

    #[test]
    fn test_import_seating() {
        let (store, batch) = store_with_batch();
        import_roster(
            &store,
            batch,
            &[row(&[("Reg No", "24UAM101"), ("Name", "A"), ("Code", "UAM")])],
            DEFAULT_ROOM_CAPACITY,
        )
        .unwrap();

        let rows = vec![
            row(&[("register_no", "24uam101"), ("hall_no", "G01"), ("seat_no", "3")]),
            row(&[("register_no", "24UAM999"), ("hall_no", "G01"), ("seat_no", "4")]),
            row(&[("register_no", "24UAM101"), ("hall_no", "G01"), ("seat_no", "x")]),
            row(&[("register_no", "24UAM101"), ("seat_no", "3")]),
        ];

        let report = import_seating(&store, batch, &rows).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.not_found, 1);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(
            report.rejected[1].reason,
            RejectReason::MissingField(Field::Hall)
        );
        assert_eq!(store.seat_map(batch).unwrap()[0].seat, 3);
    }

    #[test]
    fn test_unknown_batch_fails_fast() {
        let store = MemoryStore::new();
        let err = import_seating(&store, BatchId::new(), &[]).unwrap_err();
        assert!(matches!(err, crate::RosterError::Store(e) if e.is_not_found()));
    }
}
