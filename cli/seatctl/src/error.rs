//! Error handling and display for the CLI.

use colored::Colorize;
use seatplan_engine::{AllocationError, StoreError};
use seatplan_roster::RosterError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("No batch selected and none exist yet.")]
    NoBatch,

    #[error("Batch not found: {0}")]
    BatchNotFound(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(hint) = hint_for(err) {
        eprintln!("\n{}", format!("Hint: {hint}").yellow());
    }
}

fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return match cli_err {
            CliError::NoBatch => Some("Create one with `seatctl batches create`."),
            CliError::BatchNotFound(_) => {
                Some("Run `seatctl batches list` to see batch IDs and names.")
            }
            CliError::RoomNotFound(_) => Some("Run `seatctl rooms list` to see room codes."),
        };
    }

    match err.downcast_ref::<AllocationError>() {
        Some(AllocationError::NoRoomsAvailable) => {
            return Some("Add rooms with `seatctl rooms init` or `seatctl rooms enable-all`.");
        }
        Some(AllocationError::InvalidConfig(_)) => {
            return Some("Check planner.max_departments_per_room or SEATCTL_MAX_DEPTS.");
        }
        Some(AllocationError::Store(store)) => return store_hint(store),
        None => {}
    }

    if let Some(RosterError::Store(store)) = err.downcast_ref::<RosterError>() {
        return store_hint(store);
    }

    err.downcast_ref::<StoreError>().and_then(store_hint)
}

fn store_hint(err: &StoreError) -> Option<&'static str> {
    match err {
        StoreError::DuplicateBatchName(_) => Some("Pick another name with `--name`."),
        StoreError::DuplicateRoom(_) => {
            Some("Use `seatctl rooms toggle` to change an existing room.")
        }
        StoreError::BatchNotFound(_) => {
            Some("Run `seatctl batches list` to see batch IDs and names.")
        }
        _ => None,
    }
}
