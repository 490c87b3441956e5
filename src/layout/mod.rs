//! Turns a day's tasks into absolutely positioned, non-overlapping boxes.
//!
//! Pipeline: display time strings -> clipped minute intervals -> greedy column
//! packing -> pixel geometry. Everything here is pure and is recomputed on
//! every frame.

mod interval;
mod now;
mod packer;
mod projector;
mod time;

pub use interval::{build_interval, Interval, LayoutWindow, DEFAULT_DURATION_MINUTES};
pub use now::now_indicator_top;
pub use packer::{pack_columns, ColumnAssignment};
pub use projector::{BoxGeometry, Projection};
pub use time::{format_time, format_time_24, hour_label, parse_time, try_parse_time, MINUTES_PER_DAY};

use chrono::NaiveDate;

use crate::roster::{Roster, Task};
use crate::selection::Selection;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub window: LayoutWindow,
    pub pixels_per_minute: f32,
    /// Width available to one lane; columns split it evenly
    pub lane_width: f32,
    pub min_box_height: f32,
    pub default_duration: u32,
}

impl LayoutParams {
    fn projection(&self) -> Projection {
        Projection {
            window_start: self.window.start,
            pixels_per_minute: self.pixels_per_minute,
            lane_width: self.lane_width,
            min_box_height: self.min_box_height,
        }
    }

    pub fn board_height(&self) -> f32 {
        self.window.minutes() as f32 * self.pixels_per_minute
    }
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            window: LayoutWindow::default(),
            pixels_per_minute: 1.6,
            lane_width: 240.0,
            min_box_height: 40.0,
            default_duration: DEFAULT_DURATION_MINUTES,
        }
    }
}

/// A task with its place on the board
#[derive(Debug, Clone, PartialEq)]
pub struct BoxedTask<'a> {
    pub task: &'a Task,
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
    pub column_index: usize,
    pub column_count: usize,
    pub lane_index: usize,
}

/// Lay out one group of tasks (one employee on one day) in a single lane
pub fn compute_layout<'a>(tasks: &'a [Task], params: &LayoutParams) -> Vec<BoxedTask<'a>> {
    let tasks: Vec<&Task> = tasks.iter().collect();
    layout_lane(&tasks, 0, params)
}

fn layout_lane<'a>(tasks: &[&'a Task], lane_index: usize, params: &LayoutParams) -> Vec<BoxedTask<'a>> {
    let intervals: Vec<Interval> = tasks
        .iter()
        .enumerate()
        .filter_map(|(i, task)| {
            build_interval(
                i,
                &task.time,
                task.end_time.as_deref(),
                params.window,
                params.default_duration,
            )
        })
        .collect();

    let projection = params.projection();
    let lane_offset = lane_index as f32 * params.lane_width;

    pack_columns(&intervals)
        .iter()
        .map(|assignment| {
            let geometry = projection.project(assignment, lane_offset);
            BoxedTask {
                task: tasks[assignment.interval.index],
                top: geometry.top,
                left: geometry.left,
                width: geometry.width,
                height: geometry.height,
                column_index: assignment.column_index,
                column_count: assignment.column_count,
                lane_index,
            }
        })
        .collect()
}

/// How the board splits into lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// One day; one lane per employee that has tasks that day
    SingleDay,
    /// One employee; one lane per day of the week
    WeekGrid,
}

/// A vertical strip of the board: one employee for a day, or one day of a week
#[derive(Debug, Clone)]
pub struct Lane<'a> {
    pub label: String,
    pub date: NaiveDate,
    pub employee_id: Option<String>,
    pub tasks: Vec<&'a Task>,
}

impl LayoutMode {
    pub fn lanes<'a>(&self, roster: &'a Roster, selection: &Selection) -> Vec<Lane<'a>> {
        let Some(department) = selection
            .department_id
            .as_deref()
            .and_then(|id| roster.department(id))
        else {
            return Vec::new();
        };

        match self {
            LayoutMode::SingleDay => {
                let date = selection.date;
                let employees: Vec<_> = match selection.employee_id.as_deref() {
                    Some(id) => department.employee(id).into_iter().collect(),
                    None => department.employees_with_tasks_on(date).collect(),
                };
                employees
                    .into_iter()
                    .map(|employee| Lane {
                        label: employee.name.clone(),
                        date,
                        employee_id: Some(employee.id.clone()),
                        tasks: employee.tasks_on(date).collect(),
                    })
                    .collect()
            }
            LayoutMode::WeekGrid => {
                let Some(employee) = selection
                    .employee_id
                    .as_deref()
                    .and_then(|id| department.employee(id))
                else {
                    return Vec::new();
                };
                selection
                    .visible_days()
                    .into_iter()
                    .map(|date| Lane {
                        label: date.format("%a, %b %-d").to_string(),
                        date,
                        employee_id: Some(employee.id.clone()),
                        tasks: employee.tasks_on(date).collect(),
                    })
                    .collect()
            }
        }
    }
}

/// Lay out every lane side by side, lane `i` starting at `i * lane_width`
pub fn layout_board<'a>(lanes: &[Lane<'a>], params: &LayoutParams) -> Vec<BoxedTask<'a>> {
    lanes
        .iter()
        .enumerate()
        .flat_map(|(lane_index, lane)| layout_lane(&lane.tasks, lane_index, params))
        .collect()
}
