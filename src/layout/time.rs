//! Display time strings ("2:30 PM", "14:30") to minutes since midnight and back

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parse a display time into minutes since midnight.
///
/// Accepts "H:MM" (24-hour), "H:MM AM/PM" and "H AM/PM". Anything that does not
/// parse yields 0, so callers must read 0 as "unspecified" rather than midnight.
pub fn parse_time(input: &str) -> u32 {
    try_parse_time(input).unwrap_or(0)
}

/// Like [`parse_time`] but reports malformed input as `None`
pub fn try_parse_time(input: &str) -> Option<u32> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    // Numeric part first, optional meridiem after the first space or glued on ("2:30PM")
    let (clock, meridiem) = match input.split_once(' ') {
        Some((clock, rest)) => (clock, Some(rest.trim())),
        None => split_meridiem_suffix(input),
    };

    let (hour_str, minute_str) = match clock.split_once(':') {
        Some((h, m)) => (h, Some(m)),
        None => (clock, None),
    };

    let hour = hour_str.parse::<u32>().ok()?;
    let minute = match minute_str {
        Some(m) if !m.is_empty() => m.parse::<u32>().ok()?,
        _ => 0,
    };
    if minute > 59 {
        return None;
    }

    let hour_24 = match meridiem.map(|m| m.to_ascii_lowercase()) {
        None => hour,
        Some(m) if m.is_empty() => hour,
        Some(m) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match m.as_str() {
                "am" => hour % 12,
                "pm" => hour % 12 + 12,
                _ => return None,
            }
        }
    };

    if hour_24 > 23 {
        return None;
    }

    Some(hour_24 * 60 + minute)
}

fn split_meridiem_suffix(input: &str) -> (&str, Option<&str>) {
    let split_at = input.len().saturating_sub(2);
    match (input.get(..split_at), input.get(split_at..)) {
        (Some(clock), Some(suffix))
            if !clock.is_empty()
                && (suffix.eq_ignore_ascii_case("am") || suffix.eq_ignore_ascii_case("pm")) =>
        {
            (clock, Some(suffix))
        }
        _ => (input, None),
    }
}

/// Render minutes since midnight as "h:MM AM" / "h:MM PM"
pub fn format_time(minutes: u32) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    let hour = minutes / 60;
    let minute = minutes % 60;
    let (h12, meridiem) = match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    };
    format!("{}:{:02} {}", h12, minute, meridiem)
}

/// Hour label for the timeline axis ("10 AM", "12 PM", "3 PM")
pub fn hour_label(hour: u32) -> String {
    match hour {
        0 => "12 AM".to_string(),
        1..=11 => format!("{} AM", hour),
        12 => "12 PM".to_string(),
        _ => format!("{} PM", hour - 12),
    }
}

/// Render minutes since midnight as 24-hour "HH:MM"
pub fn format_time_24(minutes: u32) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meridiem_edges() {
        assert_eq!(parse_time("12:00 AM"), 0);
        assert_eq!(parse_time("12:00 PM"), 720);
        assert_eq!(parse_time("1:05 PM"), 785);
        assert_eq!(parse_time("11:59 PM"), 1439);
        assert_eq!(parse_time("12:30 am"), 30);
    }

    #[test]
    fn meridiem_without_space() {
        assert_eq!(parse_time("2:30PM"), 870);
        assert_eq!(parse_time("2pm"), 840);
        assert_eq!(parse_time("11:15am"), 675);
        assert_eq!(try_parse_time("pm"), None);
        assert_eq!(try_parse_time("13:00pm"), None);
    }

    #[test]
    fn twenty_four_hour_input() {
        assert_eq!(parse_time("14:30"), 870);
        assert_eq!(parse_time("0:00"), 0);
        assert_eq!(parse_time("9:05"), 545);
    }

    #[test]
    fn missing_minutes_default_to_zero() {
        assert_eq!(parse_time("2 PM"), 840);
        assert_eq!(parse_time("10"), 600);
    }

    #[test]
    fn malformed_input_degrades_to_start_of_day() {
        assert_eq!(parse_time(""), 0);
        assert_eq!(parse_time("   "), 0);
        assert_eq!(parse_time("noon"), 0);
        assert_eq!(parse_time("25:00"), 0);
        assert_eq!(parse_time("10:75"), 0);
        assert_eq!(parse_time("13:00 PM"), 0);
        assert_eq!(try_parse_time("7:15 XM"), None);
    }

    #[test]
    fn every_minute_survives_display_formatting() {
        for m in 0..MINUTES_PER_DAY {
            assert_eq!(parse_time(&format_time(m)), m, "minute {}", m);
        }
    }

    #[test]
    fn labels() {
        assert_eq!(format_time(600), "10:00 AM");
        assert_eq!(format_time(0), "12:00 AM");
        assert_eq!(format_time(725), "12:05 PM");
        assert_eq!(hour_label(10), "10 AM");
        assert_eq!(hour_label(12), "12 PM");
        assert_eq!(hour_label(18), "6 PM");
        assert_eq!(format_time_24(545), "09:05");
    }
}
