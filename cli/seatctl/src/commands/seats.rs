//! Seat map and dry-run preview commands.

use std::collections::HashMap;

use anyhow::Result;
use clap::Args;
use seatplan_engine::{
    plan_pass_around, Allocation, Examinee, OccupiedSeats, SeatingStore,
};
use seatplan_id::{RegisterNo, RoomCode};
use serde::Serialize;
use tabled::Tabled;

use crate::error::CliError;
use crate::output::{display_option, print_info, print_output, print_single, OutputFormat};

use super::allocate::print_pass_summary;
use super::CommandContext;

/// Show who sits where in the current batch.
#[derive(Debug, Args)]
pub struct SeatsCommand {
    /// Only show one room.
    #[arg(long)]
    room: Option<String>,
}

/// Plan a pass without saving it.
#[derive(Debug, Args)]
pub struct PreviewCommand {
    /// Plan from scratch as `refresh` would, ignoring current seats.
    #[arg(long)]
    refresh: bool,

    /// List every planned seat instead of a per-room summary.
    #[arg(long)]
    seats: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct SeatRow {
    #[tabled(rename = "Room")]
    room: String,

    #[tabled(rename = "Seat")]
    seat: u32,

    #[tabled(rename = "Register No")]
    register_no: String,

    #[tabled(rename = "Name")]
    name: String,

    #[tabled(rename = "Dept")]
    dept: String,

    #[tabled(rename = "Course", display = "display_option")]
    course_title: Option<String>,
}

/// Join allocations with the examinee records they refer to.
fn seat_rows(allocations: &[Allocation], examinees: &[Examinee]) -> Vec<SeatRow> {
    let by_register: HashMap<&RegisterNo, &Examinee> =
        examinees.iter().map(|e| (&e.register_no, e)).collect();

    allocations
        .iter()
        .map(|allocation| {
            let examinee = by_register.get(&allocation.register_no);
            SeatRow {
                room: allocation.room.to_string(),
                seat: allocation.seat,
                register_no: allocation.register_no.to_string(),
                name: examinee.map(|e| e.name.clone()).unwrap_or_default(),
                dept: examinee.map(|e| e.dept.to_string()).unwrap_or_default(),
                course_title: examinee.and_then(|e| e.course_title.clone()),
            }
        })
        .collect()
}

impl SeatsCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        let batch = ctx.require_batch(&store)?;

        let mut allocations = store.seat_map(batch.id)?;
        if let Some(raw) = &self.room {
            let code = RoomCode::parse(raw).map_err(|_| CliError::RoomNotFound(raw.clone()))?;
            store
                .room(&code)
                .map_err(|_| CliError::RoomNotFound(raw.clone()))?;
            allocations.retain(|a| a.room == code);
        }

        let rows = seat_rows(&allocations, &store.examinees(batch.id)?);
        print_output(&rows, ctx.format);
        Ok(())
    }
}

impl PreviewCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        let batch = ctx.require_batch(&store)?;

        let rooms = store.rooms();
        let (examinees, occupied) = if self.refresh {
            (store.examinees(batch.id)?, OccupiedSeats::new())
        } else {
            let occupied: OccupiedSeats = store
                .list_occupied_seats(batch.id)?
                .into_iter()
                .map(|a| (a.room, a.seat))
                .collect();
            (store.list_unseated(batch.id)?, occupied)
        };

        let result = plan_pass_around(&examinees, &rooms, &ctx.config.planner, &occupied)?;

        match ctx.format {
            OutputFormat::Json => print_single(&serde_json::json!({
                "batch_id": batch.id,
                "dry_run": true,
                "fingerprint": result.fingerprint(),
                "result": result,
            })),
            OutputFormat::Table => {
                if self.seats {
                    print_output(&seat_rows(&result.allocations, &examinees), OutputFormat::Table);
                }
                print_pass_summary(&result, !self.seats);
                print_info("Preview only, nothing was saved");
            }
        }
        Ok(())
    }
}
