// Timestamp parsing for imported schedule cells
//
// Spreadsheets in the wild mix epoch numbers, ISO strings and several
// European/US wall-clock layouts. Wall-clock values carry no zone and are
// read in the local time zone.

use crate::utils::number::parse_leading_int;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Integers above this are treated as Unix epoch values
const EPOCH_THRESHOLD: i64 = 1_000_000_000;
/// Epoch values below this are seconds, at or above it milliseconds
const EPOCH_MILLIS_THRESHOLD: i64 = 10_000_000_000;

/// ISO-8601 local forms (`%.f` also accepts a missing fraction)
const ISO_LOCAL_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Wall-clock layouts, tried in order. `%H` accepts 1- or 2-digit hours.
/// Day-first wins over month-first for ambiguous slash dates.
const DATETIME_FORMATS: &[&str] = &[
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%d.%m.%Y", "%Y-%m-%d"];

/// Display layout for task details and the timeline
pub const DISPLAY_FORMAT: &str = "%d.%m.%Y %H:%M";
/// Layout used for CSV export
pub const EXPORT_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateParseError {
    #[error("empty date value")]
    Empty,
    #[error("unrecognized date: '{0}'")]
    Unrecognized(String),
}

/// Parse a loosely formatted timestamp.
///
/// Attempts, first success wins:
/// 1. leading integer above 1e9 as an epoch (seconds below 1e10,
///    milliseconds otherwise)
/// 2. ISO-8601 (RFC 3339 with offset, or local `yyyy-MM-ddTHH:mm[:ss]`)
/// 3. the explicit wall-clock layouts, then date-only layouts
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DateParseError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DateParseError::Empty);
    }

    if let Some(ts) = parse_epoch(value) {
        return Ok(ts);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ISO_LOCAL_FORMATS.iter().chain(DATETIME_FORMATS) {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            if let Some(ts) = local_to_utc(&naive) {
                log::trace!("parsed '{}' with {}", value, format);
                return Ok(ts);
            }
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            if let Some(ts) = date.and_hms_opt(0, 0, 0).and_then(|dt| local_to_utc(&dt)) {
                log::trace!("parsed '{}' with {}", value, format);
                return Ok(ts);
            }
        }
    }

    log::debug!("could not parse date '{}'", value);
    Err(DateParseError::Unrecognized(value.to_string()))
}

/// Epoch from the leading integer, so a fractional "1700000000.5" counts
fn parse_epoch(value: &str) -> Option<DateTime<Utc>> {
    let n = parse_leading_int(value)?;
    if n <= EPOCH_THRESHOLD {
        return None;
    }
    let millis = if n < EPOCH_MILLIS_THRESHOLD { n.checked_mul(1000)? } else { n };
    DateTime::from_timestamp_millis(millis)
}

/// Resolve a wall-clock time in the local zone. Ambiguous times (DST
/// fall-back) take the earlier instant; times inside a gap do not exist.
fn local_to_utc(naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format as `dd.MM.yyyy HH:mm` in local time
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(DISPLAY_FORMAT).to_string()
}

/// Format as `yyyy-MM-dd HH:mm` in local time
pub fn format_export(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(EXPORT_FORMAT).to_string()
}

/// Local midnight of the day containing `now`
pub fn start_of_local_day(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let midnight = now.with_timezone(&Local).date_naive().and_hms_opt(0, 0, 0)?;
    local_to_utc(&midnight)
}

/// Local midnight `days` days after the day containing `now`
pub fn local_day_offset(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    let date = now.with_timezone(&Local).date_naive() + Duration::days(days);
    local_to_utc(&date.and_hms_opt(0, 0, 0)?)
}

/// Convert a local wall-clock time to UTC; used by demo data and tests.
pub fn local_datetime(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
    local_to_utc(&naive)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_seconds_and_millis() {
        let secs = parse_timestamp("1700000000").unwrap();
        assert_eq!(secs.timestamp_millis(), 1_700_000_000_000);

        let millis = parse_timestamp("1700000000123").unwrap();
        assert_eq!(millis.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_fractional_epoch_truncated() {
        let ts = parse_timestamp("1700000000.5").unwrap();
        assert_eq!(ts.timestamp_millis(), 1_700_000_000_000);

        let millis = parse_timestamp("1700000000123.75").unwrap();
        assert_eq!(millis.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_small_integers_are_not_epochs() {
        // 2024 is not an epoch value and not a date layout either
        assert!(parse_timestamp("2024").is_err());
        assert!(parse_timestamp("1000000000").is_err());
    }

    #[test]
    fn test_rfc3339() {
        let ts = parse_timestamp("2024-01-15T08:30:00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap());

        let offset = parse_timestamp("2024-01-15T09:30:00+01:00").unwrap();
        assert_eq!(offset, ts);
    }

    #[test]
    fn test_local_layouts() {
        let expected = local_datetime(2024, 1, 15, 8, 5).unwrap();
        for raw in [
            "2024-01-15T08:05",
            "2024-01-15T08:05:00",
            "15.01.2024 08:05",
            "15.01.2024 8:05",
            "15.01.2024 08:05:00",
            "2024-01-15 08:05",
            "2024-01-15 8:05",
            "15/01/2024 08:05",
            "  15.01.2024 08:05  ",
        ] {
            assert_eq!(parse_timestamp(raw).unwrap(), expected, "layout {}", raw);
        }
    }

    #[test]
    fn test_day_first_wins_for_slashes() {
        // 03/04 is read as 3 April
        let ts = parse_timestamp("03/04/2024 10:00").unwrap();
        assert_eq!(ts, local_datetime(2024, 4, 3, 10, 0).unwrap());

        // Month-first only when day-first is impossible
        let us = parse_timestamp("12/25/2024 10:00").unwrap();
        assert_eq!(us, local_datetime(2024, 12, 25, 10, 0).unwrap());
    }

    #[test]
    fn test_date_only() {
        let midnight = local_datetime(2024, 1, 15, 0, 0).unwrap();
        assert_eq!(parse_timestamp("15.01.2024").unwrap(), midnight);
        assert_eq!(parse_timestamp("2024-01-15").unwrap(), midnight);
    }

    #[test]
    fn test_failures_are_values() {
        assert_eq!(parse_timestamp(""), Err(DateParseError::Empty));
        assert_eq!(parse_timestamp("   "), Err(DateParseError::Empty));
        assert!(matches!(parse_timestamp("tomorrow"), Err(DateParseError::Unrecognized(_))));
        assert!(parse_timestamp("32.01.2024 08:00").is_err());
        assert!(parse_timestamp("13/25/2024 10:00").is_err());
    }

    #[test]
    fn test_format_round_trip() {
        let ts = local_datetime(2024, 6, 3, 14, 45).unwrap();
        assert_eq!(format_timestamp(ts), "03.06.2024 14:45");
        assert_eq!(format_export(ts), "2024-06-03 14:45");
        assert_eq!(parse_timestamp(&format_timestamp(ts)).unwrap(), ts);
    }

    #[test]
    fn test_local_day_helpers() {
        let now = local_datetime(2024, 6, 3, 14, 45).unwrap();
        assert_eq!(start_of_local_day(now), local_datetime(2024, 6, 3, 0, 0));
        assert_eq!(local_day_offset(now, 7), local_datetime(2024, 6, 10, 0, 0));
    }
}
