//! Roster and seating import commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use seatplan_roster::{import_roster, import_seating, read_rows, RowRejection};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_info, print_output, print_single, print_success, print_warning, OutputFormat};

use super::CommandContext;

/// Import an examinee roster into the current batch.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// Roster file (.csv, .json or .toml).
    file: PathBuf,

    /// Capacity for rooms inferred from the roster's halls.
    #[arg(long)]
    room_capacity: Option<u32>,
}

/// Import pre-assigned seats for examinees already in the current batch.
#[derive(Debug, Args)]
pub struct ImportSeatingCommand {
    /// Seating file (.csv, .json or .toml) with register number, hall and seat.
    file: PathBuf,
}

#[derive(Debug, Serialize, Tabled)]
struct RejectionRow {
    #[tabled(rename = "Row")]
    row: usize,

    #[tabled(rename = "Reason")]
    reason: String,
}

impl From<&RowRejection> for RejectionRow {
    fn from(rejection: &RowRejection) -> Self {
        Self {
            row: rejection.row,
            reason: rejection.reason.to_string(),
        }
    }
}

fn print_rejections(rejected: &[RowRejection]) {
    if rejected.is_empty() {
        return;
    }
    print_warning(&format!("{} row(s) skipped", rejected.len()));
    let rows: Vec<RejectionRow> = rejected.iter().map(RejectionRow::from).collect();
    print_output(&rows, OutputFormat::Table);
}

impl ImportCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        let batch = ctx.require_batch(&store)?;
        let rows = read_rows(&self.file)
            .with_context(|| format!("Failed to read roster {:?}", self.file))?;

        let capacity = self
            .room_capacity
            .unwrap_or(ctx.config.default_room_capacity);
        let report = import_roster(&store, batch.id, &rows, capacity)?;
        ctx.save_store(&store)?;

        match ctx.format {
            OutputFormat::Json => print_single(&report),
            OutputFormat::Table => {
                print_success(&format!(
                    "Imported {} examinee(s) into '{}' ({} new, {} updated)",
                    report.imported(),
                    batch.name,
                    report.created,
                    report.updated
                ));
                if report.preassigned > 0 {
                    print_info(&format!("{} examinee(s) arrived already seated", report.preassigned));
                }
                if !report.rooms_created.is_empty() {
                    print_info(&format!(
                        "Created room(s): {}",
                        join_codes(&report.rooms_created)
                    ));
                }
                if !report.rooms_grown.is_empty() {
                    print_info(&format!("Grew room(s): {}", join_codes(&report.rooms_grown)));
                }
                print_rejections(&report.rejected);
            }
        }
        Ok(())
    }
}

impl ImportSeatingCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        let batch = ctx.require_batch(&store)?;
        let rows = read_rows(&self.file)
            .with_context(|| format!("Failed to read seating {:?}", self.file))?;

        let report = import_seating(&store, batch.id, &rows)?;
        ctx.save_store(&store)?;

        match ctx.format {
            OutputFormat::Json => print_single(&report),
            OutputFormat::Table => {
                print_success(&format!(
                    "Updated {} seat(s) in '{}'",
                    report.updated, batch.name
                ));
                if report.not_found > 0 {
                    print_warning(&format!(
                        "{} register number(s) not found in the batch",
                        report.not_found
                    ));
                }
                print_rejections(&report.rejected);
            }
        }
        Ok(())
    }
}

fn join_codes<T: std::fmt::Display>(codes: &[T]) -> String {
    codes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
