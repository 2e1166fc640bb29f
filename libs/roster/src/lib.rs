//! # seatplan-roster
//!
//! Turns loosely formatted roster files into typed examinee records.
//!
//! Rosters arrive as CSV exports, JSON arrays or TOML tables with whatever
//! column names the registrar's office used that term. This crate:
//! - Normalizes headers and matches them against known aliases ([`Field`])
//! - Validates each row, rejecting bad rows individually ([`RowRejection`])
//! - Upserts examinees into a batch, carrying pre-assigned seats along
//! - Infers rooms from the halls and seats seen in the roster
//!
//! A rejected row never aborts an import; the report lists every rejection
//! with its 1-based row number.

mod columns;
mod error;
mod import;
mod source;

pub use columns::{normalize_header, Field, Row};
pub use error::{RejectReason, RosterError, RosterResult, RowRejection};
pub use import::{
    import_roster, import_seating, parse_examinee_row, parse_seating_row, ExamineeRow,
    RosterReport, SeatingReport, SeatingRow, DEFAULT_ROOM_CAPACITY,
};
pub use source::{parse_rows, read_rows, RosterFormat};
