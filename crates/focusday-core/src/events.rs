use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerMode;

/// Record of one completed or skipped interval.
///
/// The engine produces exactly one of these per mode transition; the
/// scheduler folds it into the active task's ledger and the engine keeps
/// only the most recent one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub mode: TimerMode,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Configured duration of the interval in seconds.
    pub scheduled_secs: u64,
    /// Seconds actually run, never more than `scheduled_secs`.
    pub elapsed_secs: u64,
    /// True iff the interval ended before its scheduled duration elapsed.
    pub interrupted: bool,
}

/// Full state dump of the timer engine, for status reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub running: bool,
    pub time_left_secs: u64,
    pub total_secs: u64,
    pub completed_focus: u32,
    /// 0.0 .. 1.0 progress within the current interval.
    pub progress: f64,
    pub at: DateTime<Utc>,
}
