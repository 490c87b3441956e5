use super::packer::ColumnAssignment;

/// Absolute box geometry in pixels, relative to the top-left of the board
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGeometry {
    pub top: f32,
    pub height: f32,
    pub left: f32,
    pub width: f32,
}

/// Pixel constants shared by every box in one layout pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub window_start: u32,
    pub pixels_per_minute: f32,
    pub lane_width: f32,
    pub min_box_height: f32,
}

impl Projection {
    pub fn project(&self, assignment: &ColumnAssignment, lane_offset: f32) -> BoxGeometry {
        let interval = &assignment.interval;
        let top = interval.start_minute.saturating_sub(self.window_start) as f32
            * self.pixels_per_minute;
        let height = (interval.duration() as f32 * self.pixels_per_minute).max(self.min_box_height);
        let width = self.lane_width / assignment.column_count.max(1) as f32;
        let left = lane_offset + assignment.column_index as f32 * width;

        BoxGeometry {
            top,
            height,
            left,
            width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::interval::Interval;

    fn assignment(start: u32, end: u32, column_index: usize, column_count: usize) -> ColumnAssignment {
        ColumnAssignment {
            interval: Interval {
                start_minute: start,
                end_minute: end,
                index: 0,
            },
            column_index,
            column_count,
        }
    }

    fn projection() -> Projection {
        Projection {
            window_start: 600,
            pixels_per_minute: 1.6,
            lane_width: 240.0,
            min_box_height: 40.0,
        }
    }

    #[test]
    fn hour_long_box_in_second_column() {
        let geom = projection().project(&assignment(630, 690, 1, 2), 0.0);
        assert!((geom.top - 48.0).abs() < 1e-3);
        assert!((geom.height - 96.0).abs() < 1e-3);
        assert_eq!(geom.width, 120.0);
        assert_eq!(geom.left, 120.0);
    }

    #[test]
    fn short_tasks_get_minimum_height() {
        let geom = projection().project(&assignment(600, 610, 0, 1), 0.0);
        assert_eq!(geom.height, 40.0);
        assert_eq!(geom.top, 0.0);
    }

    #[test]
    fn lane_offset_shifts_left_edge() {
        let geom = projection().project(&assignment(600, 660, 2, 3), 480.0);
        assert_eq!(geom.width, 80.0);
        assert_eq!(geom.left, 640.0);
    }
}
