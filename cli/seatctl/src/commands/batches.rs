//! Batch commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use seatplan_engine::{BatchSummary, ExamType, NewBatch};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{display_option, print_output, print_single, print_success, OutputFormat};
use crate::resolve::resolve_batch;

use super::CommandContext;

/// Batch commands.
#[derive(Debug, Args)]
pub struct BatchesCommand {
    #[command(subcommand)]
    command: BatchesSubcommand,
}

#[derive(Debug, Subcommand)]
enum BatchesSubcommand {
    /// Create a batch and make it the active one.
    Create(CreateBatchArgs),

    /// List batches, newest first.
    List,

    /// Make a batch the active one.
    Switch(BatchArgs),

    /// Delete a batch and all of its examinees.
    Delete(BatchArgs),

    /// Remove every examinee from a batch, keeping the batch.
    Clear(BatchArgs),
}

#[derive(Debug, Args)]
struct CreateBatchArgs {
    /// Batch name. Generated from the exam type and time when omitted.
    #[arg(long)]
    name: Option<String>,

    /// Exam type (end-semester, arrear, internal).
    #[arg(long, default_value = "end-semester")]
    exam_type: ExamType,

    /// Free-form description.
    #[arg(long)]
    description: Option<String>,
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// Batch ID or name.
    batch: String,
}

impl BatchesCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            BatchesSubcommand::Create(args) => create_batch(ctx, args),
            BatchesSubcommand::List => list_batches(ctx),
            BatchesSubcommand::Switch(args) => switch_batch(ctx, args),
            BatchesSubcommand::Delete(args) => delete_batch(ctx, args),
            BatchesSubcommand::Clear(args) => clear_batch(ctx, args),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct BatchRow {
    #[tabled(rename = "")]
    #[serde(skip)]
    marker: &'static str,

    #[tabled(rename = "ID")]
    id: String,

    #[tabled(rename = "Name")]
    name: String,

    #[tabled(rename = "Exam Type")]
    exam_type: String,

    #[tabled(rename = "Records")]
    record_count: usize,

    #[tabled(rename = "Created")]
    created_at: String,

    #[tabled(rename = "Description", display = "display_option")]
    description: Option<String>,

    #[tabled(skip)]
    active: bool,
}

impl BatchRow {
    fn new(summary: BatchSummary, active_id: Option<&str>) -> Self {
        let id = summary.batch.id.to_string();
        let active = active_id == Some(id.as_str());
        Self {
            marker: if active { "*" } else { "" },
            id,
            name: summary.batch.name,
            exam_type: summary.batch.exam_type.to_string(),
            record_count: summary.record_count,
            created_at: summary.batch.created_at.format("%Y-%m-%d %H:%M").to_string(),
            description: summary.batch.description,
            active,
        }
    }
}

fn create_batch(mut ctx: CommandContext, args: CreateBatchArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let batch = store.create_batch(NewBatch {
        name: args.name,
        exam_type: args.exam_type,
        description: args.description,
    })?;
    ctx.save_store(&store)?;

    ctx.config.context.batch = Some(batch.id.to_string());
    ctx.config.save()?;

    match ctx.format {
        OutputFormat::Json => print_single(&batch),
        OutputFormat::Table => {
            print_success(&format!("Created batch '{}' ({})", batch.name, batch.id));
        }
    }
    Ok(())
}

fn list_batches(ctx: CommandContext) -> Result<()> {
    let store = ctx.open_store()?;
    let active = ctx
        .require_batch(&store)
        .ok()
        .map(|batch| batch.id.to_string());

    let rows: Vec<BatchRow> = store
        .list_batches()
        .into_iter()
        .map(|summary| BatchRow::new(summary, active.as_deref()))
        .collect();

    print_output(&rows, ctx.format);
    Ok(())
}

fn switch_batch(mut ctx: CommandContext, args: BatchArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let batch = resolve_batch(&store, &args.batch)?;

    ctx.config.context.batch = Some(batch.id.to_string());
    ctx.config.save()?;

    match ctx.format {
        OutputFormat::Json => print_single(&batch),
        OutputFormat::Table => print_success(&format!("Switched to batch '{}'", batch.name)),
    }
    Ok(())
}

fn delete_batch(mut ctx: CommandContext, args: BatchArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let batch = resolve_batch(&store, &args.batch)?;
    let removed = store.delete_batch(batch.id)?;
    ctx.save_store(&store)?;

    if ctx.config.context.batch.as_deref() == Some(batch.id.to_string().as_str()) {
        ctx.config.context.batch = None;
        ctx.config.save()?;
    }

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({
            "batch_id": batch.id,
            "examinees_removed": removed,
        })),
        OutputFormat::Table => print_success(&format!(
            "Deleted batch '{}' and {} examinee(s)",
            batch.name, removed
        )),
    }
    Ok(())
}

fn clear_batch(ctx: CommandContext, args: BatchArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let batch = resolve_batch(&store, &args.batch)?;
    let removed = store.clear_batch(batch.id)?;
    ctx.save_store(&store)?;

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({
            "batch_id": batch.id,
            "examinees_removed": removed,
        })),
        OutputFormat::Table => print_success(&format!(
            "Removed {} examinee(s) from batch '{}'",
            removed, batch.name
        )),
    }
    Ok(())
}
