//! Input validation applied before any command reaches a store.
//!
//! Every validator returns `None` when the value is acceptable, or a
//! user-visible message otherwise. Handlers collect the messages and reject
//! the request with all of them at once. Lengths count characters, not bytes,
//! and are measured after trimming.

use chrono::NaiveDate;

pub const MEMBER_NAME_MIN: usize = 2;
pub const MEMBER_NAME_MAX: usize = 100;
pub const EVENT_TITLE_MAX: usize = 100;
pub const EVENT_DESCRIPTION_MAX: usize = 500;
pub const JUSTIFICATION_MAX: usize = 1000;

/// Letters (ASCII and Latin-1 accented `À`..=`ÿ`), spaces, hyphens, apostrophes.
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || ('\u{C0}'..='\u{FF}').contains(&c) || c.is_whitespace() || c == '-' || c == '\''
}

/// Validate a member name: 2-100 chars, letters, spaces, hyphens and apostrophes only.
pub fn validate_member_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len < MEMBER_NAME_MIN {
        return Some(format!("Name must be at least {MEMBER_NAME_MIN} characters"));
    }
    if len > MEMBER_NAME_MAX {
        return Some(format!("Name must be at most {MEMBER_NAME_MAX} characters"));
    }
    if !trimmed.chars().all(is_name_char) {
        return Some("Name may only contain letters, spaces, hyphens and apostrophes".to_string());
    }
    None
}

/// Validate a required text field with a max length.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate an optional text field with a max length (empty is OK).
pub fn validate_optional(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    if value.trim().chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

pub fn validate_event_title(title: &str) -> Option<String> {
    validate_required(title, "Title", EVENT_TITLE_MAX)
}

pub fn validate_event_description(description: &str) -> Option<String> {
    validate_optional(description, "Description", EVENT_DESCRIPTION_MAX)
}

pub fn validate_justification(justification: &str) -> Option<String> {
    validate_optional(justification, "Justification", JUSTIFICATION_MAX)
}

/// Parse a `YYYY-MM-DD` date. The shape is checked first so that chrono's
/// more lenient parser (e.g. single-digit months) is never reached.
pub fn parse_event_date(value: &str) -> Result<NaiveDate, String> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return Err("Date must use the YYYY-MM-DD format".to_string());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| format!("Date '{value}' is not a valid calendar date"))
}

/// Trim an optional text field, mapping blank input to `None`.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
