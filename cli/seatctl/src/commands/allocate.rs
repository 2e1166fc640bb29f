//! Allocation commands: allocate, refresh, reset.

use anyhow::Result;
use clap::Args;
use seatplan_engine::{AllocationResult, RoomFill};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_info, print_output, print_single, print_success, print_warning, OutputFormat};

use super::CommandContext;

/// Seat unseated examinees of the current batch.
#[derive(Debug, Args)]
pub struct AllocateCommand {
    /// Print one row per room filled.
    #[arg(long)]
    rooms: bool,
}

/// Clear every seat in the current batch, then allocate again.
#[derive(Debug, Args)]
pub struct RefreshCommand {
    /// Print one row per room filled.
    #[arg(long)]
    rooms: bool,
}

/// Clear every seat in the current batch.
#[derive(Debug, Args)]
pub struct ResetCommand {}

#[derive(Debug, Serialize, Tabled)]
pub(super) struct RoomFillRow {
    #[tabled(rename = "Room")]
    room: String,

    #[tabled(rename = "Departments")]
    departments: String,

    #[tabled(rename = "Filled")]
    seats_filled: u32,

    #[tabled(rename = "Capacity")]
    capacity: u32,
}

impl From<&RoomFill> for RoomFillRow {
    fn from(fill: &RoomFill) -> Self {
        Self {
            room: fill.room.to_string(),
            departments: fill
                .departments
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            seats_filled: fill.seats_filled,
            capacity: fill.capacity,
        }
    }
}

/// Human summary of a pass, shared with `preview`.
pub(super) fn print_pass_summary(result: &AllocationResult, show_rooms: bool) {
    if show_rooms {
        let rows: Vec<RoomFillRow> = result
            .rooms
            .iter()
            .filter(|fill| fill.seats_filled > 0)
            .map(RoomFillRow::from)
            .collect();
        print_output(&rows, OutputFormat::Table);
    }

    let used = result.rooms.iter().filter(|fill| fill.seats_filled > 0).count();
    print_info(&format!(
        "{} seat(s) assigned across {} room(s)",
        result.placed_count, used
    ));
    if result.unseated_remaining > 0 {
        print_warning(&format!(
            "{} examinee(s) could not be seated: add rooms or raise capacities",
            result.unseated_remaining
        ));
    }
}

impl AllocateCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        let batch = ctx.require_batch(&store)?;
        let allocator = ctx.allocator(store)?;

        let result = allocator.run_pass(batch.id)?;
        ctx.save_store(allocator.store())?;

        match ctx.format {
            OutputFormat::Json => print_single(&serde_json::json!({
                "batch_id": batch.id,
                "fingerprint": result.fingerprint(),
                "result": result,
            })),
            OutputFormat::Table => {
                if result.considered() == 0 {
                    print_info(&format!("Everyone in '{}' is already seated", batch.name));
                } else {
                    print_success(&format!("Allocated batch '{}'", batch.name));
                    print_pass_summary(&result, self.rooms);
                }
            }
        }
        Ok(())
    }
}

impl RefreshCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        let batch = ctx.require_batch(&store)?;
        let allocator = ctx.allocator(store)?;

        let outcome = allocator.refresh(batch.id)?;
        ctx.save_store(allocator.store())?;

        match ctx.format {
            OutputFormat::Json => print_single(&serde_json::json!({
                "batch_id": batch.id,
                "reset_count": outcome.reset_count,
                "fingerprint": outcome.result.fingerprint(),
                "result": outcome.result,
            })),
            OutputFormat::Table => {
                print_success(&format!(
                    "Refreshed batch '{}' ({} seat(s) cleared first)",
                    batch.name, outcome.reset_count
                ));
                print_pass_summary(&outcome.result, self.rooms);
            }
        }
        Ok(())
    }
}

impl ResetCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        let batch = ctx.require_batch(&store)?;
        let allocator = ctx.allocator(store)?;

        let reset_count = allocator.reset(batch.id)?;
        ctx.save_store(allocator.store())?;

        match ctx.format {
            OutputFormat::Json => print_single(&serde_json::json!({
                "batch_id": batch.id,
                "reset_count": reset_count,
            })),
            OutputFormat::Table => print_success(&format!(
                "Cleared {} seat(s) in batch '{}'",
                reset_count, batch.name
            )),
        }
        Ok(())
    }
}
