//! # seatplan-id
//!
//! Identifier and code types for the seatplan workspace.
//!
//! ## Design Principles
//!
//! - Codes coming from rosters are normalized once, at the boundary
//! - Every code has a canonical string form with strict parsing
//! - Types are distinct so a room code can never be passed as a department
//!
//! ## Formats
//!
//! Batches are system-generated: [`BatchId`] is `bat_` plus a ULID, e.g.
//! `bat_01HV4Z2WQXKJNM8GPQY6VBKC3D`.
//!
//! Everything else is a human-supplied code:
//! - [`RegisterNo`]: trimmed, upper-cased, ASCII alphanumeric (`24UAM101`)
//! - [`RoomCode`]: trimmed room label (`G01`, `Hall A`)
//! - [`DeptCode`]: trimmed department/course code (`UAM`, `CS-101`)

mod batch;
mod error;
mod macros;
mod types;

pub use batch::BatchId;
pub use error::IdError;
pub use types::*;
