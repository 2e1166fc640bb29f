//! CLI commands.

mod allocate;
mod batches;
mod context;
mod import;
mod rooms;
mod seats;
mod status;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use seatplan_engine::{Allocator, Batch, MemoryStore};
use tracing::debug;

use crate::config::Config;
use crate::error::CliError;
use crate::logging;
use crate::output::OutputFormat;
use crate::resolve::resolve_batch;
use crate::state::{StateFile, StateLock};

/// seatctl - Seat examinees across exam rooms.
#[derive(Debug, Parser)]
#[command(name = "seatctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Batch ID or name. Defaults to the saved context, then the newest batch.
    #[arg(long, global = true, env = "SEATCTL_BATCH")]
    batch: Option<String>,

    /// State file to read and write instead of the configured one.
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage batches (one exam sitting each).
    Batches(batches::BatchesCommand),

    /// Manage exam rooms.
    Rooms(rooms::RoomsCommand),

    /// Import an examinee roster (CSV, JSON or TOML).
    Import(import::ImportCommand),

    /// Import pre-assigned seating for existing examinees.
    ImportSeating(import::ImportSeatingCommand),

    /// Seat every unseated examinee of the batch.
    Allocate(allocate::AllocateCommand),

    /// Clear all seats in the batch and allocate from scratch.
    Refresh(allocate::RefreshCommand),

    /// Clear all seats in the batch.
    Reset(allocate::ResetCommand),

    /// Show seated/unseated counts and room capacity.
    Status(status::StatusCommand),

    /// Show the seat map.
    Seats(seats::SeatsCommand),

    /// Plan a pass without saving it.
    Preview(seats::PreviewCommand),

    /// Show or clear saved CLI context.
    Context(context::ContextCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub fn run(self) -> Result<()> {
        if let Commands::Version = self.command {
            println!("seatctl {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        let format = OutputFormat::parse(&self.format);

        let mut config = Config::load()?;
        if let Some(path) = self.state {
            config.state_file = Some(path);
        }
        logging::init(&config.log_level, self.log_json);

        let state = StateFile::new(config.state_path()?);
        debug!(state = %state.path().display(), "Using state file");

        let ctx = CommandContext::new(config, state, format, self.batch)?;

        match self.command {
            Commands::Batches(cmd) => cmd.run(ctx),
            Commands::Rooms(cmd) => cmd.run(ctx),
            Commands::Import(cmd) => cmd.run(ctx),
            Commands::ImportSeating(cmd) => cmd.run(ctx),
            Commands::Allocate(cmd) => cmd.run(ctx),
            Commands::Refresh(cmd) => cmd.run(ctx),
            Commands::Reset(cmd) => cmd.run(ctx),
            Commands::Status(cmd) => cmd.run(ctx),
            Commands::Seats(cmd) => cmd.run(ctx),
            Commands::Preview(cmd) => cmd.run(ctx),
            Commands::Context(cmd) => cmd.run(ctx),
            Commands::Version => Ok(()),
        }
    }
}

/// Shared command context.
///
/// Holds the state lock for as long as the command runs, so a load and the
/// save that follows it are never interleaved with another seatctl process.
pub struct CommandContext {
    pub config: Config,
    pub state: StateFile,
    pub format: OutputFormat,
    pub batch: Option<String>,
    _lock: StateLock,
}

impl CommandContext {
    /// Take the state lock, waiting for any other command to finish.
    pub fn new(
        config: Config,
        state: StateFile,
        format: OutputFormat,
        batch: Option<String>,
    ) -> Result<Self> {
        let lock = state.lock()?;
        Ok(Self {
            config,
            state,
            format,
            batch,
            _lock: lock,
        })
    }

    /// Load the store from the state file.
    pub fn open_store(&self) -> Result<MemoryStore> {
        self.state.load()
    }

    pub fn save_store(&self, store: &MemoryStore) -> Result<()> {
        self.state.save(store)
    }

    /// Build an allocator over a loaded store.
    pub fn allocator(&self, store: MemoryStore) -> Result<Allocator<MemoryStore>> {
        Ok(Allocator::new(store, self.config.planner.clone())?)
    }

    /// Resolve the current batch, preferring flag over context, falling back
    /// to the most recently created batch.
    pub fn require_batch(&self, store: &MemoryStore) -> Result<Batch> {
        match self.batch.as_deref().or(self.config.context.batch.as_deref()) {
            Some(ident) => resolve_batch(store, ident),
            None => store.latest_batch().ok_or_else(|| CliError::NoBatch.into()),
        }
    }
}
