//! Output formatting for CLI commands.
//!
//! Tables go to stdout through `tabled`. JSON output is wrapped in a small
//! envelope carrying the schema version, with object keys sorted so output
//! diffs cleanly between runs.

use colored::{ColoredString, Colorize};
use serde::Serialize;
use tabled::{Table, Tabled};

const CLI_SCHEMA_VERSION: &str = "seatplan.cli.v1";

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
}

impl OutputFormat {
    /// Unknown names fall back to tables.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Table
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: ?Sized> {
    #[serde(rename = "schemaVersion")]
    schema_version: &'static str,
    data: &'a T,
}

/// Render `data` inside the JSON envelope.
fn render_json<T: Serialize + ?Sized>(data: &T) -> String {
    let envelope = Envelope {
        schema_version: CLI_SCHEMA_VERSION,
        data,
    };
    // Going through `Value` sorts object keys.
    serde_json::to_value(&envelope)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}

/// Print rows as a table, or as a JSON array.
pub fn print_output<T: Serialize + Tabled>(rows: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", render_json(rows)),
        OutputFormat::Table if rows.is_empty() => println!("{}", "Nothing to show.".dimmed()),
        OutputFormat::Table => println!("{}", Table::new(rows)),
    }
}

/// Print one JSON document.
pub fn print_single<T: Serialize>(data: &T) {
    println!("{}", render_json(data));
}

fn status_line(label: ColoredString, message: &str) -> String {
    format!("{} {}", label.bold(), message)
}

pub fn print_success(message: &str) {
    println!("{}", status_line("Success:".green(), message));
}

pub fn print_info(message: &str) {
    println!("{}", status_line("Info:".blue(), message));
}

/// Warnings go to stderr so JSON on stdout stays parseable.
pub fn print_warning(message: &str) {
    eprintln!("{}", status_line("Warning:".yellow(), message));
}

/// `-` for absent values in table cells.
pub fn display_option(opt: &Option<String>) -> String {
    opt.as_deref().unwrap_or("-").to_string()
}
