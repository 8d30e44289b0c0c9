//! Row-to-entity parsing helpers.
//!
//! Every repo converts `libsql::Row` (column-indexed) into typed entity
//! structs. These helpers isolate the parsing logic: timestamps, nullable
//! text, boolean flags and JSON-encoded ID sets.

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::DatabaseError;

/// `9999-12-31T23:59:59.999999Z` in microseconds since the epoch.
const LATEST_STORABLE_MICROS: i64 = 253_402_300_799_999_999;

/// Latest timestamp that keeps the fixed-width four-digit-year form.
#[must_use]
pub fn latest_storable_datetime() -> DateTime<Utc> {
    DateTime::from_timestamp_micros(LATEST_STORABLE_MICROS).unwrap_or_default()
}

/// Format a timestamp for storage.
///
/// Always UTC with microseconds and a `Z` suffix, so every stored value has
/// the same width and `expires_at <= ?` comparisons in SQL are chronological.
/// Values past year 9999 are clamped to [`latest_storable_datetime`].
#[must_use]
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.min(latest_storable_datetime())
        .to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Escape `\`, `%` and `_` so `text` matches literally in a
/// `LIKE ... ESCAPE '\'` pattern.
#[must_use]
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 and `SQLite`'s default `datetime('now')` format
/// (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read an INTEGER 0/1 column as `bool`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_bool(row: &libsql::Row, idx: i32) -> Result<bool, DatabaseError> {
    Ok(row.get::<i64>(idx)? != 0)
}

/// Encode a set of IDs as a JSON array for a TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Other` if serialization fails.
pub fn encode_id_set(ids: &BTreeSet<String>) -> Result<String, DatabaseError> {
    serde_json::to_string(ids).map_err(|e| DatabaseError::Other(e.into()))
}

/// Decode a JSON array TEXT column into a set of IDs. Empty text is an empty set.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the column holds invalid JSON.
pub fn decode_id_set(s: &str) -> Result<BTreeSet<String>, DatabaseError> {
    if s.trim().is_empty() {
        return Ok(BTreeSet::new());
    }
    serde_json::from_str(s)
        .map_err(|e| DatabaseError::Query(format!("Invalid JSON id set '{s}': {e}")))
}

/// Build `?start, ?start+1, ...` placeholders for an `IN (...)` list.
#[must_use]
pub fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn format_datetime_is_fixed_width() {
        let a = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let b = a + chrono::Duration::microseconds(123_456);
        assert_eq!(format_datetime(a), "2026-01-02T03:04:05.000000Z");
        assert_eq!(format_datetime(a).len(), format_datetime(b).len());
        assert!(format_datetime(a) < format_datetime(b));
    }

    #[test]
    fn far_future_is_clamped_to_year_9999() {
        let clamped = format_datetime(DateTime::<Utc>::MAX_UTC);
        assert_eq!(clamped, "9999-12-31T23:59:59.999999Z");
        assert_eq!(parse_datetime(&clamped).unwrap(), latest_storable_datetime());

        let now = format_datetime(Utc::now());
        assert!(now < clamped);
        assert_eq!(clamped.len(), now.len());
    }

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("tomato"), "tomato");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn parse_datetime_accepts_both_formats() {
        let stored = parse_datetime("2026-01-02T03:04:05.000000Z").unwrap();
        let sqlite = parse_datetime("2026-01-02 03:04:05").unwrap();
        assert_eq!(stored, sqlite);
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn id_set_roundtrip_and_empty() {
        let ids: BTreeSet<String> = ["sym-b".to_string(), "sym-a".to_string()].into();
        let encoded = encode_id_set(&ids).unwrap();
        assert_eq!(encoded, r#"["sym-a","sym-b"]"#);
        assert_eq!(decode_id_set(&encoded).unwrap(), ids);
        assert!(decode_id_set("").unwrap().is_empty());
        assert!(decode_id_set("{not json").is_err());
    }

    #[test]
    fn placeholders_are_numbered_from_start() {
        assert_eq!(placeholders(2, 3), "?2, ?3, ?4");
        assert_eq!(placeholders(1, 0), "");
    }
}
