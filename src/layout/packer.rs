use super::interval::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnAssignment {
    pub interval: Interval,
    pub column_index: usize,
    pub column_count: usize,
}

/// Greedy interval-graph colouring.
///
/// Intervals are placed in start order (stable for ties) into the first column
/// whose last interval ends at or before the candidate's start. Every assignment
/// in the result carries the same final `column_count`.
pub fn pack_columns(intervals: &[Interval]) -> Vec<ColumnAssignment> {
    let mut sorted: Vec<Interval> = intervals.to_vec();
    sorted.sort_by_key(|iv| iv.start_minute);

    // End minute of the most recently placed interval per column
    let mut column_ends: Vec<u32> = Vec::new();
    let mut placed: Vec<(Interval, usize)> = Vec::with_capacity(sorted.len());

    for interval in sorted {
        let column = match column_ends
            .iter()
            .position(|end| *end <= interval.start_minute)
        {
            Some(column) => {
                column_ends[column] = interval.end_minute;
                column
            }
            None => {
                column_ends.push(interval.end_minute);
                column_ends.len() - 1
            }
        };
        placed.push((interval, column));
    }

    let column_count = column_ends.len();
    placed
        .into_iter()
        .map(|(interval, column_index)| ColumnAssignment {
            interval,
            column_index,
            column_count,
        })
        .collect()
}
