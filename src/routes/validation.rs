use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{AppError, Result};

/// Convert Unix timestamp to RFC3339 string, defaulting to now if invalid
pub fn timestamp_to_rfc3339(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

/// Parse a numeric path id
///
/// Ids travel as strings in paths; anything that is not a positive integer
/// is rejected before touching storage.
pub fn parse_id(raw: &str) -> Result<u64> {
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => {
            tracing::debug!("Rejected path id {:?}", raw);
            Err(AppError::InvalidParameters(format!("Invalid id: {}", raw)))
        }
    }
}

/// Reject an empty required string field
pub fn require_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidParameters(format!("{} is required", field)));
    }
    Ok(())
}

/// Body of endpoints that only carry an `action`
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_to_rfc3339() {
        assert_eq!(timestamp_to_rfc3339(0), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(parse_id("0"), Err(AppError::InvalidParameters(_))));
        assert!(matches!(parse_id("-1"), Err(AppError::InvalidParameters(_))));
        assert!(matches!(parse_id("abc"), Err(AppError::InvalidParameters(_))));
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("x", "name").is_ok());
        assert!(require_non_empty("  ", "name").is_err());
    }
}
