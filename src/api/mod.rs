mod types;
mod client;
mod time;

pub use types::*;
pub use client::{ApiError, ApiResult, AttendanceClient};
pub use time::{build_timestamp, end_from_slots, parse_timestamp, slots_between, split_timestamp, timestamp_at};
