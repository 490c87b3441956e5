use chrono::{NaiveTime, Timelike};

/// Vertical offset of the current-time marker line.
///
/// Times before the window start pin the marker to the top edge.
pub fn now_indicator_top(now: NaiveTime, window_start: u32, pixels_per_minute: f32) -> f32 {
    let now_minutes = (now.hour() * 60 + now.minute()) as f32 + now.second() as f32 / 60.0;
    ((now_minutes - window_start as f32) * pixels_per_minute).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn inside_window() {
        let top = now_indicator_top(at(11, 30), 600, 1.6);
        assert!((top - 144.0).abs() < 1e-3);
    }

    #[test]
    fn before_window_clamps_to_top() {
        assert_eq!(now_indicator_top(at(7, 45), 600, 1.6), 0.0);
        assert_eq!(now_indicator_top(at(0, 0), 600, 1.6), 0.0);
    }

    #[test]
    fn seconds_move_the_marker() {
        let a = now_indicator_top(NaiveTime::from_hms_opt(12, 0, 0).unwrap(), 600, 1.6);
        let b = now_indicator_top(NaiveTime::from_hms_opt(12, 0, 30).unwrap(), 600, 1.6);
        assert!(b > a);
    }
}
