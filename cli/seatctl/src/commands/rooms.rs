//! Room commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use seatplan_engine::{Room, StoreError};
use seatplan_id::RoomCode;
use serde::Serialize;
use tabled::Tabled;

use crate::error::CliError;
use crate::output::{print_info, print_output, print_single, print_success, OutputFormat};

use super::CommandContext;

/// Floors laid out by `rooms init`, ground floor first.
const DEFAULT_FLOORS: [&str; 6] = ["G", "1", "2", "3", "4", "5"];

/// Rooms per floor laid out by `rooms init`.
const ROOMS_PER_FLOOR: u32 = 9;

/// Room commands.
#[derive(Debug, Args)]
pub struct RoomsCommand {
    #[command(subcommand)]
    command: RoomsSubcommand,
}

#[derive(Debug, Subcommand)]
enum RoomsSubcommand {
    /// List rooms in planning order: ground floor first, then by code.
    List,

    /// Add a room.
    Add(AddRoomArgs),

    /// Flip a room between available and unavailable.
    Toggle(RoomArgs),

    /// Create the default layout (G01..G09 through 501..509), skipping existing rooms.
    Init(InitRoomsArgs),

    /// Mark every room available.
    EnableAll,
}

#[derive(Debug, Args)]
struct AddRoomArgs {
    /// Room code, e.g. G01.
    code: String,

    /// Seats in the room. Defaults to the configured room capacity.
    #[arg(long)]
    capacity: Option<u32>,

    /// Add the room as unavailable.
    #[arg(long)]
    unavailable: bool,
}

#[derive(Debug, Args)]
struct RoomArgs {
    /// Room code.
    code: String,
}

#[derive(Debug, Args)]
struct InitRoomsArgs {
    /// Seats per room. Defaults to the configured room capacity.
    #[arg(long)]
    capacity: Option<u32>,
}

impl RoomsCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            RoomsSubcommand::List => list_rooms(ctx),
            RoomsSubcommand::Add(args) => add_room(ctx, args),
            RoomsSubcommand::Toggle(args) => toggle_room(ctx, args),
            RoomsSubcommand::Init(args) => init_rooms(ctx, args),
            RoomsSubcommand::EnableAll => enable_all(ctx),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct RoomRow {
    #[tabled(rename = "Room")]
    code: String,

    #[tabled(rename = "Capacity")]
    capacity: u32,

    #[tabled(rename = "Available", display = "display_available")]
    available: bool,
}

impl From<Room> for RoomRow {
    fn from(room: Room) -> Self {
        Self {
            capacity: room.capacity(),
            code: room.code.into_inner(),
            available: room.available,
        }
    }
}

fn display_available(available: &bool) -> String {
    let label = if *available { "yes" } else { "no" };
    label.to_string()
}

/// Room codes of the default layout, in creation order.
fn default_layout() -> Vec<String> {
    DEFAULT_FLOORS
        .iter()
        .flat_map(|floor| (1..=ROOMS_PER_FLOOR).map(move |n| format!("{floor}{n:02}")))
        .collect()
}

/// Parse a room code given on the command line.
fn room_code(raw: &str) -> Result<RoomCode> {
    RoomCode::parse(raw).map_err(|_| CliError::RoomNotFound(raw.to_string()).into())
}

fn list_rooms(ctx: CommandContext) -> Result<()> {
    let store = ctx.open_store()?;
    let rows: Vec<RoomRow> = store.rooms().into_iter().map(RoomRow::from).collect();
    print_output(&rows, ctx.format);
    Ok(())
}

fn add_room(ctx: CommandContext, args: AddRoomArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let code = RoomCode::parse(&args.code)?;
    let mut room = Room::new(
        code,
        args.capacity.unwrap_or(ctx.config.default_room_capacity),
    )?;
    if args.unavailable {
        room = room.unavailable();
    }

    store.add_room(room.clone())?;
    ctx.save_store(&store)?;

    match ctx.format {
        OutputFormat::Json => print_single(&room),
        OutputFormat::Table => print_success(&format!(
            "Added room {} with {} seats",
            room.code,
            room.capacity()
        )),
    }
    Ok(())
}

fn toggle_room(ctx: CommandContext, args: RoomArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let code = room_code(&args.code)?;
    let available = match store.toggle_room(&code) {
        Ok(available) => available,
        Err(StoreError::RoomNotFound(_)) => return Err(CliError::RoomNotFound(args.code).into()),
        Err(e) => return Err(e.into()),
    };
    ctx.save_store(&store)?;

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({
            "room": code,
            "available": available,
        })),
        OutputFormat::Table => {
            let state = if available { "available" } else { "unavailable" };
            print_success(&format!("Room {code} is now {state}"));
        }
    }
    Ok(())
}

fn init_rooms(ctx: CommandContext, args: InitRoomsArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let capacity = args.capacity.unwrap_or(ctx.config.default_room_capacity);

    let mut created = Vec::new();
    let mut existing = 0usize;
    for raw in default_layout() {
        let room = Room::new(RoomCode::parse(&raw)?, capacity)?;
        match store.add_room(room) {
            Ok(()) => created.push(raw),
            Err(StoreError::DuplicateRoom(_)) => existing += 1,
            Err(e) => return Err(e.into()),
        }
    }
    ctx.save_store(&store)?;

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({
            "created": created,
            "existing": existing,
            "capacity": capacity,
        })),
        OutputFormat::Table => {
            print_success(&format!(
                "Created {} room(s) with {} seats each",
                created.len(),
                capacity
            ));
            if existing > 0 {
                print_info(&format!("{existing} room(s) already existed"));
            }
        }
    }
    Ok(())
}

fn enable_all(ctx: CommandContext) -> Result<()> {
    let store = ctx.open_store()?;
    let changed = store.enable_all_rooms();
    ctx.save_store(&store)?;

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({
            "enabled": changed,
            "rooms_total": store.rooms().len(),
        })),
        OutputFormat::Table => print_success(&format!("Enabled {changed} room(s)")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = default_layout();
        assert_eq!(layout.len(), 54);
        assert_eq!(layout.first().map(String::as_str), Some("G01"));
        assert_eq!(layout.get(9).map(String::as_str), Some("101"));
        assert_eq!(layout.last().map(String::as_str), Some("509"));
    }

    #[test]
    fn test_default_layout_plans_in_creation_order() {
        let layout = default_layout();
        let mut rooms: Vec<Room> = layout
            .iter()
            .rev()
            .map(|code| Room::new(RoomCode::parse(code).unwrap(), 30).unwrap())
            .collect();
        seatplan_engine::sort_rooms(&mut rooms);

        let planned: Vec<&str> = rooms.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(planned, layout.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_room_row_display() {
        let room = Room::new(RoomCode::parse("G01").unwrap(), 30)
            .unwrap()
            .unavailable();
        let row = RoomRow::from(room);
        assert_eq!(row.code, "G01");
        assert_eq!(row.capacity, 30);
        assert_eq!(display_available(&row.available), "no");
    }
}
