use crate::error::{AppError, Result};

/// Extracts a required string field from a decrypted record.
///
/// Absent, empty, and whitespace-only values are all rejected with a
/// "<field> is required" validation error, so callers act only on fields
/// that are really there.
pub fn require_str(field: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{} is required", field))),
    }
}
