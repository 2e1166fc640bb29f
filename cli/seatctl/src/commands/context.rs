//! Context commands (saved active batch).

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::output::{print_single, print_success, OutputFormat};

use super::CommandContext;

/// Manage saved CLI context.
#[derive(Debug, Args)]
pub struct ContextCommand {
    #[command(subcommand)]
    command: ContextSubcommand,
}

#[derive(Debug, Subcommand)]
enum ContextSubcommand {
    /// Show the saved context and where state lives.
    Show,

    /// Forget the active batch.
    Clear,
}

#[derive(Debug, Serialize)]
struct ContextView {
    state_file: String,
    batch: Option<String>,
    batch_name: Option<String>,
    max_departments_per_room: usize,
    default_room_capacity: u32,
}

impl ContextCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            ContextSubcommand::Show => show(ctx),
            ContextSubcommand::Clear => clear(ctx),
        }
    }
}

fn show(ctx: CommandContext) -> Result<()> {
    let store = ctx.open_store()?;
    let batch = ctx.require_batch(&store).ok();

    let view = ContextView {
        state_file: ctx.state.path().display().to_string(),
        batch: batch.as_ref().map(|b| b.id.to_string()),
        batch_name: batch.map(|b| b.name),
        max_departments_per_room: ctx.config.planner.max_departments_per_room,
        default_room_capacity: ctx.config.default_room_capacity,
    };

    match ctx.format {
        OutputFormat::Json => print_single(&view),
        OutputFormat::Table => {
            println!("state_file: {}", view.state_file);
            println!("batch: {}", view.batch.as_deref().unwrap_or("-"));
            println!("batch_name: {}", view.batch_name.as_deref().unwrap_or("-"));
            println!("max_departments_per_room: {}", view.max_departments_per_room);
            println!("default_room_capacity: {}", view.default_room_capacity);
        }
    }

    Ok(())
}

fn clear(mut ctx: CommandContext) -> Result<()> {
    ctx.config.context.batch = None;
    ctx.config.save()?;

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({ "ok": true })),
        OutputFormat::Table => print_success("Cleared saved context"),
    }

    Ok(())
}
