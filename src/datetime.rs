//! Date/time utilities for Boards.
//!
//! Timestamps are stored by SQLite as `YYYY-MM-DD HH:MM:SS` in UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Format used by SQLite's `datetime('now')`.
pub const DB_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a stored timestamp (SQLite or RFC3339 format) as UTC.
pub fn parse_db_datetime(datetime_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(datetime_str) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(datetime_str, DB_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Format a stored timestamp in the given timezone.
///
/// Returns the original string if either the timestamp or the timezone
/// cannot be parsed.
pub fn format_datetime(datetime_str: &str, timezone: &str, format: &str) -> String {
    let tz: Tz = match timezone.parse() {
        Ok(tz) => tz,
        Err(_) => return datetime_str.to_string(),
    };

    match parse_db_datetime(datetime_str) {
        Some(utc_dt) => utc_dt.with_timezone(&tz).format(format).to_string(),
        None => datetime_str.to_string(),
    }
}

/// Format a stored timestamp with the default display format.
pub fn format_datetime_default(datetime_str: &str, timezone: &str) -> String {
    format_datetime(datetime_str, timezone, "%b %d, %Y %H:%M")
}

/// Describe how long ago a stored timestamp was, relative to `now`.
///
/// ```
/// use boards::datetime::natural_time;
/// use chrono::{TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
/// assert_eq!(natural_time("2024-01-15 10:25:00", now), "5 minutes ago");
/// ```
pub fn natural_time(datetime_str: &str, now: DateTime<Utc>) -> String {
    let Some(then) = parse_db_datetime(datetime_str) else {
        return datetime_str.to_string();
    };

    let secs = (now - then).num_seconds();
    if secs < 10 {
        return "now".to_string();
    }

    let (amount, unit) = if secs < 60 {
        (secs, "second")
    } else if secs < 3600 {
        (secs / 60, "minute")
    } else if secs < 86_400 {
        (secs / 3600, "hour")
    } else if secs < 30 * 86_400 {
        (secs / 86_400, "day")
    } else if secs < 365 * 86_400 {
        (secs / (30 * 86_400), "month")
    } else {
        (secs / (365 * 86_400), "year")
    };

    let plural = if amount == 1 { "" } else { "s" };
    format!("{amount} {unit}{plural} ago")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_datetime_sqlite() {
        let result = format_datetime("2024-01-15 10:30:00", "Asia/Tokyo", "%Y/%m/%d %H:%M");
        assert_eq!(result, "2024/01/15 19:30");
    }

    #[test]
    fn test_format_datetime_rfc3339() {
        let result = format_datetime("2024-01-15T10:30:00+00:00", "UTC", "%Y/%m/%d %H:%M");
        assert_eq!(result, "2024/01/15 10:30");
    }

    #[test]
    fn test_format_datetime_invalid_inputs() {
        let dt = "2024-01-15 10:30:00";
        assert_eq!(format_datetime(dt, "Invalid/Zone", "%Y"), dt);
        assert_eq!(format_datetime("not a date", "UTC", "%Y"), "not a date");
    }

    #[test]
    fn test_format_datetime_default() {
        let result = format_datetime_default("2024-01-15 10:30:00", "UTC");
        assert_eq!(result, "Jan 15, 2024 10:30");
    }

    #[test]
    fn test_natural_time() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(natural_time("2024-01-15 10:29:58", now), "now");
        assert_eq!(natural_time("2024-01-15 10:29:30", now), "30 seconds ago");
        assert_eq!(natural_time("2024-01-15 10:29:00", now), "1 minute ago");
        assert_eq!(natural_time("2024-01-15 08:30:00", now), "2 hours ago");
        assert_eq!(natural_time("2024-01-12 10:30:00", now), "3 days ago");
        assert_eq!(natural_time("2023-11-15 10:30:00", now), "2 months ago");
        assert_eq!(natural_time("2022-01-15 10:30:00", now), "2 years ago");
        assert_eq!(natural_time("garbage", now), "garbage");
    }
}
