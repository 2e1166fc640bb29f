//! Identifier and code definitions.

use crate::{define_code, IdError};

// =============================================================================
// Human-supplied codes
// =============================================================================

/// Maximum length of a registration number.
pub const REGISTER_NO_MAX_LEN: usize = 50;

/// Maximum length of a room or department code.
pub const CODE_MAX_LEN: usize = 20;

define_code!(RegisterNo, normalize_register_no);
define_code!(RoomCode, normalize_room_code);
define_code!(DeptCode, normalize_dept_code);

fn normalize_register_no(raw: &str) -> Result<String, IdError> {
    const KIND: &str = "register number";

    let value = raw.trim().to_ascii_uppercase();
    check_len(KIND, &value, REGISTER_NO_MAX_LEN)?;

    if let Some(ch) = value.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(IdError::InvalidCharacter {
            kind: KIND,
            value,
            ch,
        });
    }

    Ok(value)
}

fn normalize_room_code(raw: &str) -> Result<String, IdError> {
    normalize_label("room code", raw)
}

fn normalize_dept_code(raw: &str) -> Result<String, IdError> {
    normalize_label("department code", raw)
}

/// Room and department labels are free-form but must stay printable on one line.
fn normalize_label(kind: &'static str, raw: &str) -> Result<String, IdError> {
    let value = raw.trim().to_string();
    check_len(kind, &value, CODE_MAX_LEN)?;

    if let Some(ch) = value
        .chars()
        .find(|c| !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ' ')))
    {
        return Err(IdError::InvalidCharacter { kind, value, ch });
    }

    Ok(value)
}

fn check_len(kind: &'static str, value: &str, max: usize) -> Result<(), IdError> {
    if value.is_empty() {
        return Err(IdError::Empty { kind });
    }

    let len = value.chars().count();
    if len > max {
        return Err(IdError::TooLong { kind, max, len });
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
