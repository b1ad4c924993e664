//! RFC3339 timestamp validation.
//!
//! The API accepts a restricted RFC3339 form: `YYYY-MM-DDTHH:MM:SS.fff` with
//! mandatory fractional seconds, followed by either `Z` or a numeric offset
//! such as `+05:30`.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset};

/// Parse a timestamp in the restricted RFC3339 form.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the value is not in the accepted format.
pub fn parse_rfc3339(value: &str) -> Result<DateTime<FixedOffset>> {
    let invalid = || {
        Error::Validation(format!(
            "Invalid RFC3339 timestamp format: `{value}` (expected e.g. 2024-03-15T14:30:45.123Z)"
        ))
    };

    if !has_strict_shape(value) {
        return Err(invalid());
    }

    DateTime::parse_from_rfc3339(value).map_err(|_| invalid())
}

/// Check that `end` is strictly after `begin` when both bounds are given.
///
/// Each bound that is present must itself be a valid timestamp.
///
/// # Errors
///
/// Returns [`Error::Validation`] for a malformed bound or a non-increasing range.
pub fn validate_range(begin: Option<&str>, end: Option<&str>) -> Result<()> {
    let begin = begin.map(parse_rfc3339).transpose()?;
    let end = end.map(parse_rfc3339).transpose()?;

    if let (Some(begin), Some(end)) = (begin, end) {
        if end <= begin {
            return Err(Error::Validation(
                "endTimestamp must be strictly greater than beginTimestamp".to_string(),
            ));
        }
    }

    Ok(())
}

// `DateTime::parse_from_rfc3339` treats the fraction as optional and accepts
// a space separator or lowercase `t`/`z`; all of these are rejected here.
fn has_strict_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() > 20
        && bytes[10] == b'T'
        && bytes[19] == b'.'
        && bytes[20].is_ascii_digit()
        && !value.ends_with('z')
}
