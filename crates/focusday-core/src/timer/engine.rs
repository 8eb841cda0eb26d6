//! Countdown engine implementation.
//!
//! The engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()`
//! periodically. Remaining time is computed from elapsed wall-clock
//! deltas, so a caller that ticks late (backgrounded tab, sleeping
//! process) still completes the interval at the right point.
//!
//! ## Mode cycle
//!
//! ```text
//! focus -> break -> focus -> ... -> focus -> long-break -> focus
//! ```
//!
//! Leaving focus increments the completed-focus counter; every
//! `long_break_interval`-th completion routes to a long break when long
//! breaks are enabled. Leaving either break always returns to focus.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerSettings::default());
//! engine.start();
//! // In a loop:
//! if let Some(event) = engine.tick() {
//!     // interval completed, fold the event into the ledger
//! }
//! ```
//!
//! Every command has a `*_at` variant taking an explicit timestamp; the
//! plain methods use the system clock. Tests drive the automaton with
//! fixed timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::settings::{TimerMode, TimerSettings, TimerSettingsPatch};
use crate::events::{SessionEvent, TimerSnapshot};

/// Core countdown engine.
///
/// Operates on wall-clock deltas -- no internal thread.
/// The caller is responsible for calling `tick()` periodically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    settings: TimerSettings,
    mode: TimerMode,
    running: bool,
    /// Remaining time in milliseconds for the current interval.
    remaining_ms: u64,
    /// Duration the current interval was scheduled with, in seconds.
    /// Captured at interval entry so an edit to the settings mid-interval
    /// does not rewrite what this interval was scheduled for.
    interval_scheduled_secs: u64,
    /// Completed focus intervals since the last reset.
    completed_focus: u32,
    /// When the current interval first started running, if it has.
    #[serde(default)]
    interval_started_at: Option<DateTime<Utc>>,
    /// Timestamp (ms since epoch) of the last flush while running.
    /// Used to compute elapsed time between ticks.
    #[serde(default)]
    last_tick_epoch_ms: Option<i64>,
    /// The most recent completed or skipped interval.
    #[serde(default)]
    last_session: Option<SessionEvent>,
}

impl TimerEngine {
    /// Create a new engine in focus mode, not running.
    pub fn new(settings: TimerSettings) -> Self {
        let remaining_ms = settings.duration_ms(TimerMode::Focus);
        let interval_scheduled_secs = settings.duration_secs(TimerMode::Focus);
        Self {
            settings,
            mode: TimerMode::Focus,
            running: false,
            remaining_ms,
            interval_scheduled_secs,
            completed_focus: 0,
            interval_started_at: None,
            last_tick_epoch_ms: None,
            last_session: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Remaining whole seconds of the current interval.
    pub fn time_left_secs(&self) -> u64 {
        self.remaining_ms / 1000
    }

    pub fn completed_focus(&self) -> u32 {
        self.completed_focus
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// The most recent `SessionEvent`, or `None` after a reset.
    pub fn last_session(&self) -> Option<&SessionEvent> {
        self.last_session.as_ref()
    }

    /// Scheduled duration of the current interval in seconds.
    pub fn total_secs(&self) -> u64 {
        self.interval_scheduled_secs
    }

    /// 0.0 .. 1.0 progress within the current interval.
    pub fn progress(&self) -> f64 {
        let total_ms = self.interval_scheduled_secs.saturating_mul(1000);
        if total_ms == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_ms as f64 / total_ms as f64)
    }

    /// Build a full state snapshot.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot_at(Utc::now())
    }

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.mode,
            running: self.running,
            time_left_secs: self.time_left_secs(),
            total_secs: self.total_secs(),
            completed_focus: self.completed_focus,
            progress: self.progress(),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) {
        self.start_at(Utc::now());
    }

    /// Begin (or continue) counting down. No-op if already running.
    pub fn start_at(&mut self, now: DateTime<Utc>) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_tick_epoch_ms = Some(now.timestamp_millis());
        if self.interval_started_at.is_none() {
            self.interval_started_at = Some(now);
        }
    }

    pub fn pause(&mut self) {
        self.pause_at(Utc::now());
    }

    /// Halt ticking without altering remaining time.
    pub fn pause_at(&mut self, now: DateTime<Utc>) {
        if !self.running {
            return;
        }
        self.flush_elapsed(now.timestamp_millis());
        self.running = false;
        self.last_tick_epoch_ms = None;
    }

    /// Hard abort: back to focus with a full interval, counter cleared,
    /// last session event dropped. Whatever was in progress is discarded
    /// without emitting a `SessionEvent`.
    pub fn reset(&mut self) {
        self.mode = TimerMode::Focus;
        self.running = false;
        self.remaining_ms = self.settings.duration_ms(TimerMode::Focus);
        self.interval_scheduled_secs = self.settings.duration_secs(TimerMode::Focus);
        self.completed_focus = 0;
        self.interval_started_at = None;
        self.last_tick_epoch_ms = None;
        self.last_session = None;
    }

    pub fn skip(&mut self) -> SessionEvent {
        self.skip_at(Utc::now())
    }

    /// Force an immediate mode transition, crediting only the time that
    /// actually ran. `interrupted` is set unless the skip happens to land
    /// exactly at expiry.
    pub fn skip_at(&mut self, now: DateTime<Utc>) -> SessionEvent {
        if self.running {
            self.flush_elapsed(now.timestamp_millis());
        }
        self.transition_at(now)
    }

    pub fn tick(&mut self) -> Option<SessionEvent> {
        self.tick_at(Utc::now())
    }

    /// Call periodically while running. Returns the completed interval's
    /// event when the countdown reaches zero.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Option<SessionEvent> {
        if !self.running {
            return None;
        }
        self.flush_elapsed(now.timestamp_millis());
        if self.remaining_ms == 0 {
            return Some(self.transition_at(now));
        }
        None
    }

    pub fn update_settings(&mut self, patch: &TimerSettingsPatch) {
        self.update_settings_at(patch, Utc::now());
    }

    /// Merge sanitized settings fields. While paused or idle the visible
    /// remaining time for the active mode is recomputed from the new
    /// duration; a running countdown is never truncated.
    pub fn update_settings_at(&mut self, patch: &TimerSettingsPatch, now: DateTime<Utc>) {
        self.settings.apply(patch);
        self.settings_changed(now);
    }

    /// Replace the whole settings value (used when rehydrating from
    /// storage). An unchanged value leaves the countdown untouched;
    /// anything else follows the same recompute rules as a patch.
    pub fn set_settings_at(&mut self, settings: TimerSettings, now: DateTime<Utc>) {
        if settings == self.settings {
            return;
        }
        self.settings = settings;
        self.settings.sanitize();
        self.settings_changed(now);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn settings_changed(&mut self, now: DateTime<Utc>) {
        if !self.running {
            self.remaining_ms = self.settings.duration_ms(self.mode);
            self.interval_scheduled_secs = self.settings.duration_secs(self.mode);
        }
        // Corrective transition: a long break cannot survive long breaks
        // being disabled. Redirect to a fresh short break, no event.
        if !self.settings.enable_long_break && self.mode == TimerMode::LongBreak {
            self.mode = TimerMode::Break;
            self.remaining_ms = self.settings.duration_ms(TimerMode::Break);
            self.interval_scheduled_secs = self.settings.duration_secs(TimerMode::Break);
            if self.running {
                self.last_tick_epoch_ms = Some(now.timestamp_millis());
                self.interval_started_at = Some(now);
            } else {
                self.interval_started_at = None;
            }
        }
    }

    fn flush_elapsed(&mut self, now_ms: i64) {
        if let Some(last) = self.last_tick_epoch_ms {
            let elapsed = now_ms.saturating_sub(last).max(0) as u64;
            self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
            self.last_tick_epoch_ms = Some(now_ms);
        }
    }

    /// Close out the current interval and enter the next mode.
    ///
    /// Shared by natural expiry (`tick`) and explicit `skip`; the only
    /// difference between the two is how much time remains at this point.
    fn transition_at(&mut self, now: DateTime<Utc>) -> SessionEvent {
        let scheduled_secs = self.interval_scheduled_secs;
        let elapsed_secs = scheduled_secs.saturating_sub(self.time_left_secs());
        let event = SessionEvent {
            mode: self.mode,
            started_at: self.interval_started_at.unwrap_or(now),
            ended_at: now,
            scheduled_secs,
            elapsed_secs,
            interrupted: elapsed_secs < scheduled_secs,
        };

        let next = match self.mode {
            TimerMode::Focus => {
                self.completed_focus += 1;
                if self.settings.enable_long_break
                    && self.completed_focus % self.settings.long_break_interval == 0
                {
                    TimerMode::LongBreak
                } else {
                    TimerMode::Break
                }
            }
            TimerMode::Break | TimerMode::LongBreak => TimerMode::Focus,
        };
        self.mode = next;
        self.remaining_ms = self.settings.duration_ms(next);
        self.interval_scheduled_secs = self.settings.duration_secs(next);
        if self.running {
            self.last_tick_epoch_ms = Some(now.timestamp_millis());
            self.interval_started_at = Some(now);
        } else {
            self.last_tick_epoch_ms = None;
            self.interval_started_at = None;
        }
        self.last_session = Some(event.clone());
        event
    }
}
