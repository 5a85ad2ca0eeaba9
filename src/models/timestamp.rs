//! Timestamp helpers
//!
//! Intake and weight timestamps are stored as local `YYYY-MM-DDTHH:MM:SS`
//! text so lexical order matches chronological order.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

use crate::db::{DbError, DbResult};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current local time in storage format
pub fn now() -> String {
    Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string()
}

/// Today's local date as YYYY-MM-DD
pub fn today() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}

/// Parse a date, returning a readable error
pub fn parse_date(date: &str) -> DbResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| DbError::Invalid(format!("Invalid date '{}', expected YYYY-MM-DD", date)))
}

/// Normalize a caller-supplied timestamp, or use the current time
///
/// Accepts `YYYY-MM-DDTHH:MM:SS` (optionally with fractional seconds),
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM`, a bare date (midnight) and
/// RFC 3339 timestamps with an offset, which are converted to local time.
/// Any other trailing text is rejected.
pub fn normalize(timestamp: Option<&str>) -> DbResult<String> {
    let Some(raw) = timestamp.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(now());
    };

    // Zoned timestamps (Z or +HH:MM) are converted to local time
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Local).naive_local().format(TIMESTAMP_FORMAT).to_string());
    }

    const FORMATS: [&str; 6] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];

    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.format(TIMESTAMP_FORMAT).to_string());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Ok(format!("{}T00:00:00", date.format(DATE_FORMAT)));
    }

    Err(DbError::Invalid(format!(
        "Invalid timestamp '{}', expected YYYY-MM-DDTHH:MM:SS",
        raw
    )))
}

/// Inclusive storage-format bounds covering a whole day
pub fn day_bounds(date: &str) -> DbResult<(String, String)> {
    let date = parse_date(date)?;
    let day = date.format(DATE_FORMAT);
    Ok((format!("{}T00:00:00", day), format!("{}T23:59:59", day)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_formats() {
        assert_eq!(normalize(Some("2025-03-01T07:30:00")).unwrap(), "2025-03-01T07:30:00");
        assert_eq!(normalize(Some("2025-03-01 07:30")).unwrap(), "2025-03-01T07:30:00");
        assert_eq!(normalize(Some("2025-03-01T07:30:00.250")).unwrap(), "2025-03-01T07:30:00");
        assert_eq!(normalize(Some("2025-03-01")).unwrap(), "2025-03-01T00:00:00");
    }

    #[test]
    fn test_normalize_converts_offsets_to_local() {
        for raw in ["2025-03-01T23:30:00+02:00", "2025-03-01T23:30:00.5+02:00", "2025-03-01T21:30:00Z"] {
            let expected = DateTime::parse_from_rfc3339(raw)
                .unwrap()
                .with_timezone(&Local)
                .naive_local()
                .format(TIMESTAMP_FORMAT)
                .to_string();
            assert_eq!(normalize(Some(raw)).unwrap(), expected, "{}", raw);
        }
        // Fractional and whole-second forms of the same instant agree
        assert_eq!(
            normalize(Some("2025-03-01T23:30:00.5+02:00")).unwrap(),
            normalize(Some("2025-03-01T23:30:00+02:00")).unwrap()
        );
    }

    #[test]
    fn test_normalize_defaults_to_now() {
        let ts = normalize(None).unwrap();
        assert_eq!(ts.len(), 19);
        assert!(normalize(Some("  ")).is_ok());
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(normalize(Some("yesterday")).is_err());
        assert!(normalize(Some("2025-13-01")).is_err());
        assert!(normalize(Some("2025-03-01T23:30:00 CET")).is_err());
        assert!(normalize(Some("2025-03-01T23:30:00.5junk")).is_err());
    }

    #[test]
    fn test_day_bounds() {
        let (start, end) = day_bounds("2025-03-01").unwrap();
        assert_eq!(start, "2025-03-01T00:00:00");
        assert_eq!(end, "2025-03-01T23:59:59");
        assert!(day_bounds("03/01/2025").is_err());
    }
}
