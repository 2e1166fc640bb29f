//! Reading roster rows from CSV, JSON and TOML documents.
//!
//! JSON accepts either a top-level array of objects or an object with a
//! `rows` array. TOML expects `[[rows]]` tables. Scalar cells are converted
//! to strings; nulls become blank cells.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::columns::Row;
use crate::error::{RosterError, RosterResult};

/// Supported roster document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFormat {
    Csv,
    Json,
    Toml,
}

impl RosterFormat {
    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> RosterResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            _ => Err(RosterError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Read every non-blank row of a roster file.
pub fn read_rows(path: &Path) -> RosterResult<Vec<Row>> {
    let format = RosterFormat::from_path(path)?;
    let text = fs::read_to_string(path).map_err(|source| RosterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_rows(&text, format)
}

/// Parse roster rows from an in-memory document.
pub fn parse_rows(text: &str, format: RosterFormat) -> RosterResult<Vec<Row>> {
    // Spreadsheet exports often start with a UTF-8 BOM.
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let rows = match format {
        RosterFormat::Csv => parse_csv(text)?,
        RosterFormat::Json => rows_from_json(serde_json::from_str(text)?)?,
        RosterFormat::Toml => {
            let table: toml::Table = toml::from_str(text)?;
            rows_from_json(serde_json::to_value(table)?)?
        }
    };

    Ok(rows.into_iter().filter(|row| !row.is_blank()).collect())
}

fn parse_csv(text: &str) -> RosterResult<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut rows: Vec<Row> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(headers.iter().zip(record.iter()).collect());
    }
    Ok(rows)
}

fn rows_from_json(document: Value) -> RosterResult<Vec<Row>> {
    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("rows") {
            Some(Value::Array(items)) => items,
            _ => return Err(RosterError::Shape("expected a `rows` array".to_string())),
        },
        _ => return Err(RosterError::Shape("expected an array of objects".to_string())),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(map) => Ok(row_from_object(map)),
            _ => Err(RosterError::Shape(format!("row {} is not an object", idx + 1))),
        })
        .collect()
}

fn row_from_object(map: serde_json::Map<String, Value>) -> Row {
    map.into_iter()
        .map(|(header, value)| (header, cell_text(value)))
        .collect()
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::Field;

    #[test]
    fn test_csv_with_bom_and_aliases() {
        let text = "\u{feff}Register-No,Student Name,Course Code\n24uam101 , Asha ,UAM\n,,\n";
        let rows = parse_rows(text, RosterFormat::Csv).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(Field::RegisterNo), Some("24uam101"));
        assert_eq!(rows[0].get(Field::Name), Some("Asha"));
    }

    #[test]
    fn test_json_numbers_become_text() {
        let text = r#"[{"reg_no": "24UAM101", "name": "Asha", "code": "UAM", "hall": "G01", "seat": 4, "title": null}]"#;
        let rows = parse_rows(text, RosterFormat::Json).unwrap();
        assert_eq!(rows[0].get(Field::Seat), Some("4"));
        assert_eq!(rows[0].get(Field::CourseTitle), None);
    }

    #[test]
    fn test_json_rows_wrapper() {
        let text = r#"{"rows": [{"regno": "24UAM101"}]}"#;
        assert_eq!(parse_rows(text, RosterFormat::Json).unwrap().len(), 1);

        let err = parse_rows(r#"{"students": []}"#, RosterFormat::Json).unwrap_err();
        assert!(matches!(err, RosterError::Shape(_)));
    }

    #[test]
    fn test_toml_rows() {
        let text = r#"
[[rows]]
register_no = "24UAM101"
name = "Asha"
dept = "UAM"
seat = 3
"#;
        let rows = parse_rows(text, RosterFormat::Toml).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(Field::Dept), Some("UAM"));
        assert_eq!(rows[0].get(Field::Seat), Some("3"));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            RosterFormat::from_path(Path::new("roster.CSV")).unwrap(),
            RosterFormat::Csv
        );
        assert!(matches!(
            RosterFormat::from_path(Path::new("roster.xlsx")),
            Err(RosterError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_read_rows_missing_file() {
        let err = read_rows(Path::new("/nonexistent/roster.csv")).unwrap_err();
        assert!(matches!(err, RosterError::Io { .. }));
    }
}
