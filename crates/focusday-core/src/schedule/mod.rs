pub mod day_key;
mod scheduler;
mod task;

pub use day_key::{day_key, day_key_for, parse_day_key};
pub use scheduler::{DaySchedule, Scheduler};
pub use task::{display_tracked_seconds, SessionRecord, TaskEntry};
