use super::time::{parse_time, try_parse_time};

pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Clock-time range rendered on the vertical axis, in minutes since midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutWindow {
    pub start: u32,
    pub end: u32,
}

impl LayoutWindow {
    pub fn from_hours(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start: start_hour * 60,
            end: end_hour * 60,
        }
    }

    pub fn minutes(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn hours(&self) -> impl Iterator<Item = u32> {
        (self.start / 60)..(self.end / 60)
    }
}

impl Default for LayoutWindow {
    fn default() -> Self {
        Self::from_hours(10, 19)
    }
}

/// Half-open minute range `[start_minute, end_minute)` for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start_minute: u32,
    pub end_minute: u32,
    /// Position of the source task in the caller's list
    pub index: usize,
}

impl Interval {
    pub fn duration(&self) -> u32 {
        self.end_minute - self.start_minute
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start_minute < other.end_minute && other.start_minute < self.end_minute
    }
}

/// Build the visible interval for a task, or `None` when it falls outside the window.
///
/// A missing, malformed or non-increasing end time falls back to
/// `start + default_duration`.
pub fn build_interval(
    index: usize,
    time: &str,
    end_time: Option<&str>,
    window: LayoutWindow,
    default_duration: u32,
) -> Option<Interval> {
    let start = parse_time(time);
    let default_duration = default_duration.max(1);

    let end = end_time
        .and_then(try_parse_time)
        .filter(|end| *end > start)
        .unwrap_or(start.saturating_add(default_duration));

    let start_minute = start.max(window.start);
    let end_minute = end.min(window.end);
    if start_minute >= end_minute {
        return None;
    }

    Some(Interval {
        start_minute,
        end_minute,
        index,
    })
}
