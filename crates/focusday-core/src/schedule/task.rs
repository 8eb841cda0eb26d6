//! Task entries and their session ledgers.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::events::SessionEvent;
use crate::timer::TimerMode;

/// A folded `SessionEvent` with its generated id, as stored on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    #[serde(flatten)]
    pub event: SessionEvent,
}

impl SessionRecord {
    pub fn new(event: SessionEvent) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event,
        }
    }
}

/// One task within a day's schedule.
///
/// Focus/break totals are the fold of `sessions`; `tracked_seconds` is the
/// independent stopwatch accumulator. A running stopwatch is represented by
/// `timer_started_at` alone - the displayed total is derived, never stored,
/// while running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub total_focus_seconds: u64,
    #[serde(default)]
    pub total_break_seconds: u64,
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
    #[serde(default)]
    pub tracked_seconds: u64,
    #[serde(default, deserialize_with = "lenient_instant")]
    pub timer_started_at: Option<DateTime<Utc>>,
}

/// Accept RFC 3339 strings, epoch milliseconds, or anything else as `None`.
///
/// Older persisted shapes stored epoch milliseconds here; a corrupted value
/// degrades to a stopped stopwatch instead of failing the whole load.
fn lenient_instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    })
}

impl TaskEntry {
    /// Create a task with a trimmed title. Callers reject blank titles
    /// before getting here.
    pub fn new(title: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            created_at: now,
            updated_at: now,
            total_focus_seconds: 0,
            total_break_seconds: 0,
            sessions: Vec::new(),
            tracked_seconds: 0,
            timer_started_at: None,
        }
    }

    /// Append a session record and bump the matching aggregate.
    pub fn fold_session(&mut self, record: SessionRecord, now: DateTime<Utc>) {
        match record.event.mode {
            TimerMode::Focus => self.total_focus_seconds += record.event.elapsed_secs,
            TimerMode::Break | TimerMode::LongBreak => {
                self.total_break_seconds += record.event.elapsed_secs
            }
        }
        self.sessions.push(record);
        self.updated_at = now;
    }

    /// Start the stopwatch. No-op if already running.
    pub fn start_timer(&mut self, now: DateTime<Utc>) {
        if self.timer_started_at.is_none() {
            self.timer_started_at = Some(now);
            self.updated_at = now;
        }
    }

    /// Stop the stopwatch, folding the elapsed wall-clock time into
    /// `tracked_seconds`. No-op if not running.
    pub fn stop_timer(&mut self, now: DateTime<Utc>) {
        if let Some(started) = self.timer_started_at.take() {
            self.tracked_seconds += (now - started).num_seconds().max(0) as u64;
            self.updated_at = now;
        }
    }

    pub fn timer_running(&self) -> bool {
        self.timer_started_at.is_some()
    }

    /// Tracked seconds including the live stopwatch, at `now`.
    pub fn live_tracked_seconds(&self, now: DateTime<Utc>) -> u64 {
        display_tracked_seconds(self.tracked_seconds, self.timer_started_at, now)
    }

    /// Recompute the focus/break aggregates from the session list.
    pub fn recompute_totals(&mut self) {
        self.total_focus_seconds = 0;
        self.total_break_seconds = 0;
        for record in &self.sessions {
            match record.event.mode {
                TimerMode::Focus => self.total_focus_seconds += record.event.elapsed_secs,
                TimerMode::Break | TimerMode::LongBreak => {
                    self.total_break_seconds += record.event.elapsed_secs
                }
            }
        }
    }

    /// Repair a task loaded from an older persisted shape: aggregates that
    /// were never stored are rebuilt by folding the session list.
    pub fn normalize(&mut self) {
        if self.total_focus_seconds == 0
            && self.total_break_seconds == 0
            && !self.sessions.is_empty()
        {
            self.recompute_totals();
        }
    }
}

/// Displayed tracked time: the persisted accumulator plus the live
/// stopwatch run, as whole seconds.
///
/// Pure so display code and tests can evaluate it with a fixed clock.
pub fn display_tracked_seconds(
    tracked_seconds: u64,
    timer_started_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> u64 {
    match timer_started_at {
        Some(started) => tracked_seconds + (now - started).num_seconds().max(0) as u64,
        None => tracked_seconds,
    }
}
