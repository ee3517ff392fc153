//! Timezone and timestamp helpers shared by the import, query and free-slot paths.

use chrono::{
    DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Utc,
};
use chrono_tz::Tz;

use crate::error::ValidationError;

/// Timezone used when neither the request nor the config names one.
pub const DEFAULT_TIMEZONE: &str = "Asia/Singapore";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an IANA timezone name such as `Asia/Singapore`.
pub fn parse_timezone(field: &str, name: &str) -> Result<Tz, ValidationError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ValidationError::invalid(field, format!("unknown timezone '{name}'")))
}

/// Parse a time of day written as `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(field: &str, raw: &str) -> Result<NaiveTime, ValidationError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| ValidationError::invalid(field, format!("expected HH:MM, got '{raw}'")))
}

/// Parse a timestamp. RFC 3339 input keeps its own offset; naive input
/// (`2025-11-18T09:00`) is read as wall-clock time in `tz`.
pub fn parse_timestamp(
    field: &str,
    raw: &str,
    tz: Tz,
) -> Result<DateTime<FixedOffset>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::invalid(field, "empty timestamp"));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(localize(tz, naive).with_timezone(&tz).fixed_offset());
        }
    }
    Err(ValidationError::invalid(
        field,
        format!("malformed timestamp '{raw}'"),
    ))
}

/// Resolve a wall-clock time in `tz` to an instant.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times inside a
/// DST gap are moved forward by an hour.
pub fn localize(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive)),
    }
}

/// `[date 00:00, date+1 00:00)` in `tz`.
pub fn day_bounds(tz: Tz, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = localize(tz, date.and_time(NaiveTime::MIN));
    let next = date.succ_opt().unwrap_or(date);
    let end = localize(tz, next.and_time(NaiveTime::MIN));
    (start, end)
}

/// Render an instant in `tz` with its numeric offset.
pub fn in_zone(dt: DateTime<Utc>, tz: Tz) -> DateTime<FixedOffset> {
    dt.with_timezone(&tz).fixed_offset()
}
