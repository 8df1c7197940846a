//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Postgres TEXT has no built-in length enforcement.

use crate::error::{AppError, AppResult};

// ── Text length limits ──────────────────────────────────────────────

/// Names: family, deceased, person, tradition, story title
pub const MAX_NAME_LEN: usize = 200;

/// Notes and short messages: invitation / access-request messages, reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Long free text: biography, story content, practice
pub const MAX_TEXT_LEN: usize = 20_000;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Upper bound on list inputs (invite batches, grant lists, tags)
pub const MAX_LIST_LEN: usize = 100;

// ── Validation helpers ──────────────────────────────────────────────

fn invalid(field: &str, message: String) -> AppError {
    AppError::validation(message).with_detail("field", field)
}

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(invalid(
            field,
            format!("{field} is too long ({} chars, max {max_len})", value.len()),
        ));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> AppResult<()> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(invalid(
            field,
            format!("{field} is too long ({} chars, max {max_len})", v.len()),
        ));
    }
    Ok(())
}

/// Validate the number of entries in a list input.
pub fn validate_list_len<T>(values: &[T], field: &str, max_len: usize) -> AppResult<()> {
    if values.len() > max_len {
        return Err(invalid(
            field,
            format!("{field} has too many entries ({}, max {max_len})", values.len()),
        ));
    }
    Ok(())
}

/// Treat blank strings as absent (used by partial updates).
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn required_text_rejects_blank() {
        let err = validate_required_text("   ", "name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.message, "name must not be empty");
        assert_eq!(err.details.unwrap()["field"], "name");
    }

    #[test]
    fn required_text_rejects_too_long() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate_required_text(&long, "name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text("Zhang San", "name", MAX_NAME_LEN).is_ok());
    }

    #[test]
    fn optional_text() {
        assert!(validate_optional_text(&None, "message", MAX_NOTE_LEN).is_ok());
        let long = Some("x".repeat(MAX_NOTE_LEN + 1));
        assert!(validate_optional_text(&long, "message", MAX_NOTE_LEN).is_err());
    }

    #[test]
    fn list_len() {
        assert!(validate_list_len(&[1, 2, 3], "user_ids", 3).is_ok());
        assert!(validate_list_len(&[1, 2, 3, 4], "user_ids", 3).is_err());
    }

    #[test]
    fn non_blank_filters() {
        assert_eq!(non_blank(&Some("  ".into())), None);
        assert_eq!(non_blank(&Some(" a ".into())), Some("a"));
        assert_eq!(non_blank(&None), None);
    }
}
