//! Conversions between backend ISO timestamps and the display strings the board works with

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::layout::{format_time, try_parse_time, MINUTES_PER_DAY};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse a backend timestamp into local wall-clock time.
///
/// Timestamps carrying an offset are converted to the local zone; naive ones
/// are taken as local already.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// "2025-05-20T14:00:00" -> (2025-05-20, "2:00 PM")
pub fn split_timestamp(raw: &str) -> Option<(NaiveDate, String)> {
    let dt = parse_timestamp(raw)?;
    let minutes = dt.hour() * 60 + dt.minute();
    Some((dt.date(), format_time(minutes)))
}

/// Build a naive backend timestamp from a date and a display time
pub fn build_timestamp(date: NaiveDate, display_time: &str) -> Option<String> {
    let minutes = try_parse_time(display_time)?;
    Some(timestamp_at(date, minutes))
}

pub fn timestamp_at(date: NaiveDate, minutes: u32) -> String {
    let minutes = minutes.min(MINUTES_PER_DAY - 1);
    let time = NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN);
    date.and_time(time).format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// End minute for a task that lasts `slots` slots, kept on the same day
pub fn end_from_slots(start_minutes: u32, slots: u32, slot_minutes: u32) -> u32 {
    start_minutes
        .saturating_add(slots.max(1).saturating_mul(slot_minutes))
        .min(MINUTES_PER_DAY - 1)
}

/// Number of whole slots covering `[start, end)`, at least one
pub fn slots_between(start_minutes: u32, end_minutes: u32, slot_minutes: u32) -> u32 {
    let slot_minutes = slot_minutes.max(1);
    let span = end_minutes.saturating_sub(start_minutes);
    span.div_ceil(slot_minutes).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
    }

    #[test]
    fn naive_timestamps_split_into_date_and_display_time() {
        assert_eq!(
            split_timestamp("2025-05-20T14:00:00"),
            Some((day(), "2:00 PM".to_string()))
        );
        assert_eq!(
            split_timestamp("2025-05-20T09:05:00.123"),
            Some((day(), "9:05 AM".to_string()))
        );
        assert_eq!(split_timestamp("2025-05-20T10:30"), Some((day(), "10:30 AM".to_string())));
        assert_eq!(split_timestamp(""), None);
        assert_eq!(split_timestamp("yesterday"), None);
    }

    #[test]
    fn offset_timestamps_parse() {
        assert!(parse_timestamp("2025-05-20T14:00:00Z").is_some());
        assert!(parse_timestamp("2025-05-20T14:00:00+03:00").is_some());
    }

    #[test]
    fn timestamps_from_display_time() {
        assert_eq!(
            build_timestamp(day(), "1:20 PM").as_deref(),
            Some("2025-05-20T13:20:00")
        );
        assert_eq!(build_timestamp(day(), "soon"), None);
        assert_eq!(timestamp_at(day(), 600), "2025-05-20T10:00:00");
    }

    #[test]
    fn slot_arithmetic() {
        assert_eq!(end_from_slots(600, 3, 20), 660);
        assert_eq!(end_from_slots(600, 0, 20), 620);
        assert_eq!(end_from_slots(1430, 2, 20), 1439);
        assert_eq!(end_from_slots(600, u32::MAX, u32::MAX), 1439);
        assert_eq!(slots_between(600, 660, 20), 3);
        assert_eq!(slots_between(600, 665, 20), 4);
        assert_eq!(slots_between(600, 600, 20), 1);
    }
}
