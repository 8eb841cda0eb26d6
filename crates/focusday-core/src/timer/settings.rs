//! User-configurable interval durations and notification flags.
//!
//! Settings are only ever mutated through [`TimerSettings::apply`], which
//! sanitizes every field: a zero duration or interval keeps the previous
//! value. `sanitize()` runs the same clamping after deserialization so a
//! malformed stored value cannot produce a zero-length interval.

use serde::{Deserialize, Serialize};

/// The countdown's current interval type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimerMode {
    Focus,
    Break,
    LongBreak,
}

/// Interval durations and notification preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_true")]
    pub enable_long_break: bool,
    /// Count of completed focus intervals between long breaks.
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
}

/// Partial settings update. `None` fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerSettingsPatch {
    pub focus_minutes: Option<u32>,
    pub break_minutes: Option<u32>,
    pub long_break_minutes: Option<u32>,
    pub enable_long_break: Option<bool>,
    pub long_break_interval: Option<u32>,
    pub sound_enabled: Option<bool>,
    pub notifications_enabled: Option<bool>,
}

fn default_focus_minutes() -> u32 {
    25
}
fn default_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_long_break_interval() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            break_minutes: default_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            enable_long_break: true,
            long_break_interval: default_long_break_interval(),
            sound_enabled: true,
            notifications_enabled: true,
        }
    }
}

/// Keep `value` if it is a usable duration, otherwise fall back.
fn sanitize_positive(value: Option<u32>, fallback: u32) -> u32 {
    match value {
        Some(v) if v >= 1 => v,
        _ => fallback,
    }
}

impl TimerSettings {
    /// Merge a patch, keeping the previous value for every field the patch
    /// leaves unset or sets to an unusable value.
    pub fn apply(&mut self, patch: &TimerSettingsPatch) {
        self.focus_minutes = sanitize_positive(patch.focus_minutes, self.focus_minutes);
        self.break_minutes = sanitize_positive(patch.break_minutes, self.break_minutes);
        self.long_break_minutes =
            sanitize_positive(patch.long_break_minutes, self.long_break_minutes);
        self.long_break_interval =
            sanitize_positive(patch.long_break_interval, self.long_break_interval);
        if let Some(v) = patch.enable_long_break {
            self.enable_long_break = v;
        }
        if let Some(v) = patch.sound_enabled {
            self.sound_enabled = v;
        }
        if let Some(v) = patch.notifications_enabled {
            self.notifications_enabled = v;
        }
    }

    /// Clamp loaded values so every duration is at least one minute.
    pub fn sanitize(&mut self) {
        if self.focus_minutes < 1 {
            self.focus_minutes = default_focus_minutes();
        }
        if self.break_minutes < 1 {
            self.break_minutes = default_break_minutes();
        }
        if self.long_break_minutes < 1 {
            self.long_break_minutes = default_long_break_minutes();
        }
        if self.long_break_interval < 1 {
            self.long_break_interval = default_long_break_interval();
        }
    }

    /// Configured duration of `mode` in seconds.
    ///
    /// Uses saturating arithmetic to prevent overflow with large values.
    pub fn duration_secs(&self, mode: TimerMode) -> u64 {
        let minutes = match mode {
            TimerMode::Focus => self.focus_minutes,
            TimerMode::Break => self.break_minutes,
            TimerMode::LongBreak => self.long_break_minutes,
        };
        (minutes as u64).saturating_mul(60)
    }

    /// Configured duration of `mode` in milliseconds.
    pub fn duration_ms(&self, mode: TimerMode) -> u64 {
        self.duration_secs(mode).saturating_mul(1000)
    }
}
