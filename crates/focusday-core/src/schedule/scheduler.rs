//! Day-keyed schedule map and its operations.
//!
//! The scheduler owns the map of day key -> [`DaySchedule`] plus the
//! selected-day cursor, and is the only code that mutates them. It folds
//! the engine's `SessionEvent`s into the active task of the day the event
//! ended in, and runs the per-day exclusive stopwatch.
//!
//! All time-dependent operations take `now` explicitly; callers pass
//! `Utc::now()` and tests pass fixed instants.

use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::day_key::{day_key_for, parse_day_key};
use super::task::{SessionRecord, TaskEntry};
use crate::events::SessionEvent;

/// One calendar day's tasks and stopwatch state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    /// Human-readable map key, e.g. `"Monday 10.03.2025"`.
    pub key: String,
    /// Sortable date backing the key.
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    /// Task attached to the running stopwatch, if any.
    #[serde(default)]
    pub active_task_id: Option<String>,
    /// Insertion order.
    #[serde(default)]
    pub tasks: Vec<TaskEntry>,
}

impl DaySchedule {
    fn new(key: String, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            key,
            date,
            created_at: now,
            active_task_id: None,
            tasks: Vec::new(),
        }
    }

    pub fn task(&self, id: &str) -> Option<&TaskEntry> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn task_mut(&mut self, id: &str) -> Option<&mut TaskEntry> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Stop any running stopwatch that is not the active task, folding its
    /// elapsed time. Unreachable through this module's operations, but run
    /// after every mutation anyway.
    fn stop_stray_timers(&mut self, now: DateTime<Utc>) {
        let active = self.active_task_id.clone();
        for task in &mut self.tasks {
            if task.timer_running() && active.as_deref() != Some(task.id.as_str()) {
                task.stop_timer(now);
            }
        }
    }

    /// Repair a day loaded from storage: normalize every task, drop an
    /// activation that points nowhere or at a stopped stopwatch, and stop
    /// timers the activation does not cover.
    fn normalize(&mut self, now: DateTime<Utc>) {
        for task in &mut self.tasks {
            task.normalize();
        }
        let valid = self
            .active_task_id
            .as_deref()
            .and_then(|id| self.task(id))
            .map(|t| t.timer_running())
            .unwrap_or(false);
        if !valid {
            self.active_task_id = None;
        }
        self.stop_stray_timers(now);
    }
}

/// The day-keyed task scheduler.
#[derive(Debug, Clone)]
pub struct Scheduler {
    days: HashMap<String, DaySchedule>,
    selected: String,
}

impl Scheduler {
    /// Fresh state: an empty schedule for today, selected.
    pub fn new(now: DateTime<Utc>) -> Self {
        let mut scheduler = Self {
            days: HashMap::new(),
            selected: String::new(),
        };
        let today = day_key_for(now);
        scheduler.ensure_day(&today, now);
        scheduler.selected = today;
        scheduler
    }

    /// Rehydrate from persisted parts, normalizing defensively.
    ///
    /// Today's schedule is (re)created and the stored selection is honored
    /// when present, synthesizing its day if storage lost it.
    pub fn from_parts(
        mut days: HashMap<String, DaySchedule>,
        selected: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        for (key, day) in days.iter_mut() {
            day.key = key.clone();
            day.normalize(now);
        }
        let mut scheduler = Self {
            days,
            selected: String::new(),
        };
        let today = day_key_for(now);
        scheduler.ensure_day(&today, now);
        match selected {
            Some(key) if !key.trim().is_empty() => scheduler.set_selected_day(&key, now),
            _ => scheduler.selected = today,
        }
        scheduler
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn days(&self) -> &HashMap<String, DaySchedule> {
        &self.days
    }

    /// Days most recent first.
    pub fn days_sorted(&self) -> Vec<&DaySchedule> {
        let mut days: Vec<&DaySchedule> = self.days.values().collect();
        days.sort_by(|a, b| b.date.cmp(&a.date));
        days
    }

    pub fn day(&self, key: &str) -> Option<&DaySchedule> {
        self.days.get(key)
    }

    pub fn selected_key(&self) -> &str {
        &self.selected
    }

    pub fn selected_day(&self) -> Option<&DaySchedule> {
        self.days.get(&self.selected)
    }

    pub fn today_key(&self, now: DateTime<Utc>) -> String {
        day_key_for(now)
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Make sure today's schedule exists. Sessions crossing midnight while
    /// the process stays alive land in the correct day regardless, because
    /// `log_session` derives its key from the event's end time.
    pub fn refresh_today(&mut self, now: DateTime<Utc>) {
        let today = day_key_for(now);
        self.ensure_day(&today, now);
    }

    /// Switch the viewing context. A missing day is synthesized from the
    /// key's date suffix (or `now` if unparseable) so selection never
    /// fails.
    pub fn set_selected_day(&mut self, key: &str, now: DateTime<Utc>) {
        self.ensure_day(key, now);
        self.selected = key.to_string();
    }

    /// Append a task to the selected day. Blank titles are rejected.
    ///
    /// When nothing is active yet the new task is auto-activated and its
    /// stopwatch starts immediately; an already-running task is never
    /// displaced.
    pub fn add_task(&mut self, title: &str, now: DateTime<Utc>) -> Option<String> {
        if title.trim().is_empty() {
            return None;
        }
        let day = self.selected_day_mut(now);
        let mut task = TaskEntry::new(title, now);
        let id = task.id.clone();
        if day.active_task_id.is_none() {
            task.start_timer(now);
            day.active_task_id = Some(id.clone());
        }
        day.tasks.push(task);
        day.stop_stray_timers(now);
        Some(id)
    }

    /// Rename a task. A blank title is a no-op preserving the prior title.
    pub fn update_task_title(&mut self, id: &str, title: &str, now: DateTime<Utc>) -> bool {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return false;
        }
        let day = self.selected_day_mut(now);
        match day.task_mut(id) {
            Some(task) => {
                task.title = trimmed.to_string();
                task.updated_at = now;
                true
            }
            None => false,
        }
    }

    /// Manually overwrite a task's tracked seconds. Rejected while the
    /// task's stopwatch is running.
    pub fn set_tracked_seconds(&mut self, id: &str, seconds: u64, now: DateTime<Utc>) -> bool {
        let day = self.selected_day_mut(now);
        match day.task_mut(id) {
            Some(task) if !task.timer_running() => {
                task.tracked_seconds = seconds;
                task.updated_at = now;
                true
            }
            _ => false,
        }
    }

    /// Remove a task from the selected day. Deleting the active task hands
    /// the stopwatch to the first remaining task, or to nobody.
    pub fn delete_task(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        let day = self.selected_day_mut(now);
        let Some(index) = day.tasks.iter().position(|t| t.id == id) else {
            return false;
        };
        day.tasks.remove(index);
        if day.active_task_id.as_deref() == Some(id) {
            day.active_task_id = day.tasks.first().map(|t| t.id.clone());
            if let Some(first) = day.tasks.first_mut() {
                first.start_timer(now);
            }
        }
        day.stop_stray_timers(now);
        true
    }

    /// Remove a whole day. When the selected day goes away, selection
    /// falls back to today if it still exists, else to the most recent
    /// remaining day, else to a freshly created today.
    pub fn delete_day(&mut self, key: &str, now: DateTime<Utc>) -> bool {
        if self.days.remove(key).is_none() {
            return false;
        }
        if self.selected == key {
            let today = day_key_for(now);
            if self.days.contains_key(&today) {
                self.selected = today;
            } else if let Some(most_recent) = self
                .days
                .values()
                .max_by_key(|d| d.date)
                .map(|d| d.key.clone())
            {
                self.selected = most_recent;
            } else {
                self.ensure_day(&today, now);
                self.selected = today;
            }
        }
        true
    }

    /// Drop everything, leaving a single empty schedule for today.
    pub fn clear_schedule(&mut self, now: DateTime<Utc>) {
        self.days.clear();
        let today = day_key_for(now);
        self.ensure_day(&today, now);
        self.selected = today;
    }

    /// The stopwatch control: stop whatever runs (folding its elapsed time
    /// into tracked seconds), then start the given task's stopwatch. An id
    /// that does not resolve within the selected day acts like `None`.
    pub fn set_active_task(&mut self, id: Option<&str>, now: DateTime<Utc>) {
        let day = self.selected_day_mut(now);
        let resolved = id
            .filter(|id| day.tasks.iter().any(|t| t.id == *id))
            .map(|id| id.to_string());
        for task in &mut day.tasks {
            task.stop_timer(now);
        }
        day.active_task_id = resolved.clone();
        if let Some(id) = resolved {
            if let Some(task) = day.task_mut(&id) {
                task.start_timer(now);
            }
        }
        day.stop_stray_timers(now);
    }

    /// Fold a completed interval into the ledger.
    ///
    /// The day is resolved from the event's end time, not from "now", so a
    /// session completing exactly at a day boundary logs against the day
    /// it ended in. Without an active task on that day the event is
    /// dropped.
    pub fn log_session(&mut self, event: &SessionEvent, now: DateTime<Utc>) -> bool {
        let key = day_key_for(event.ended_at);
        let Some(day) = self.days.get_mut(&key) else {
            return false;
        };
        let Some(active) = day.active_task_id.clone() else {
            return false;
        };
        match day.task_mut(&active) {
            Some(task) => {
                task.fold_session(SessionRecord::new(event.clone()), now);
                true
            }
            None => false,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn ensure_day(&mut self, key: &str, now: DateTime<Utc>) -> &mut DaySchedule {
        self.days.entry(key.to_string()).or_insert_with(|| {
            let date =
                parse_day_key(key).unwrap_or_else(|| now.with_timezone(&Local).date_naive());
            DaySchedule::new(key.to_string(), date, now)
        })
    }

    fn selected_day_mut(&mut self, now: DateTime<Utc>) -> &mut DaySchedule {
        let key = self.selected.clone();
        self.ensure_day(&key, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::day_key::day_key;
    use crate::timer::TimerMode;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn event_ending_at(ended_at: DateTime<Utc>, elapsed: u64) -> SessionEvent {
        SessionEvent {
            mode: TimerMode::Focus,
            started_at: ended_at - Duration::seconds(elapsed as i64),
            ended_at,
            scheduled_secs: 1500,
            elapsed_secs: elapsed,
            interrupted: elapsed < 1500,
        }
    }

    fn running_count(day: &DaySchedule) -> usize {
        day.tasks.iter().filter(|t| t.timer_running()).count()
    }

    #[test]
    fn first_task_is_auto_activated() {
        let mut s = Scheduler::new(t(0));
        let id = s.add_task("Write report", t(0)).unwrap();
        let day = s.selected_day().unwrap();
        assert_eq!(day.active_task_id.as_deref(), Some(id.as_str()));
        assert!(day.task(&id).unwrap().timer_running());
    }

    #[test]
    fn second_task_does_not_steal_the_stopwatch() {
        let mut s = Scheduler::new(t(0));
        let first = s.add_task("First", t(0)).unwrap();
        s.add_task("Second", t(5)).unwrap();
        let day = s.selected_day().unwrap();
        assert_eq!(day.active_task_id.as_deref(), Some(first.as_str()));
        assert_eq!(running_count(day), 1);
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut s = Scheduler::new(t(0));
        assert!(s.add_task("   ", t(0)).is_none());
        assert!(s.selected_day().unwrap().tasks.is_empty());
    }

    #[test]
    fn deactivation_folds_elapsed_into_tracked() {
        let mut s = Scheduler::new(t(0));
        let id = s.add_task("Write report", t(0)).unwrap();
        s.set_active_task(None, t(90));
        let day = s.selected_day().unwrap();
        let task = day.task(&id).unwrap();
        assert!(day.active_task_id.is_none());
        assert!(!task.timer_running());
        assert_eq!(task.tracked_seconds, 90);
    }

    #[test]
    fn switching_active_task_folds_the_previous_one() {
        let mut s = Scheduler::new(t(0));
        let first = s.add_task("First", t(0)).unwrap();
        let second = s.add_task("Second", t(0)).unwrap();
        s.set_active_task(Some(&second), t(60));
        let day = s.selected_day().unwrap();
        assert_eq!(day.active_task_id.as_deref(), Some(second.as_str()));
        assert_eq!(day.task(&first).unwrap().tracked_seconds, 60);
        assert!(day.task(&second).unwrap().timer_running());
        assert_eq!(running_count(day), 1);
    }

    #[test]
    fn unknown_active_id_acts_like_none() {
        let mut s = Scheduler::new(t(0));
        s.add_task("First", t(0)).unwrap();
        s.set_active_task(Some("no-such-task"), t(30));
        let day = s.selected_day().unwrap();
        assert!(day.active_task_id.is_none());
        assert_eq!(running_count(day), 0);
    }

    #[test]
    fn deleting_the_active_task_hands_off_to_the_first_remaining() {
        let mut s = Scheduler::new(t(0));
        let first = s.add_task("First", t(0)).unwrap();
        let second = s.add_task("Second", t(0)).unwrap();
        assert!(s.delete_task(&first, t(10)));
        let day = s.selected_day().unwrap();
        assert_eq!(day.active_task_id.as_deref(), Some(second.as_str()));
        assert!(day.task(&second).unwrap().timer_running());
    }

    #[test]
    fn deleting_the_last_task_clears_activation() {
        let mut s = Scheduler::new(t(0));
        let id = s.add_task("Only", t(0)).unwrap();
        s.delete_task(&id, t(10));
        let day = s.selected_day().unwrap();
        assert!(day.active_task_id.is_none());
        assert!(day.tasks.is_empty());
    }

    #[test]
    fn blank_rename_preserves_the_title() {
        let mut s = Scheduler::new(t(0));
        let id = s.add_task("Keep me", t(0)).unwrap();
        assert!(!s.update_task_title(&id, "  ", t(5)));
        assert_eq!(s.selected_day().unwrap().task(&id).unwrap().title, "Keep me");
        assert!(s.update_task_title(&id, "New name", t(6)));
        assert_eq!(s.selected_day().unwrap().task(&id).unwrap().title, "New name");
    }

    #[test]
    fn tracked_time_edit_is_rejected_while_running() {
        let mut s = Scheduler::new(t(0));
        let id = s.add_task("Busy", t(0)).unwrap();
        assert!(!s.set_tracked_seconds(&id, 1000, t(5)));
        s.set_active_task(None, t(10));
        assert!(s.set_tracked_seconds(&id, 1000, t(15)));
        assert_eq!(
            s.selected_day().unwrap().task(&id).unwrap().tracked_seconds,
            1000
        );
    }

    #[test]
    fn log_session_folds_into_the_active_task() {
        let mut s = Scheduler::new(t(0));
        let id = s.add_task("Write report", t(0)).unwrap();
        assert!(s.log_session(&event_ending_at(t(1500), 1500), t(1500)));
        let task = s.selected_day().unwrap().task(&id).unwrap();
        assert_eq!(task.total_focus_seconds, 1500);
        assert_eq!(task.sessions.len(), 1);
    }

    #[test]
    fn log_session_without_active_task_is_dropped() {
        let mut s = Scheduler::new(t(0));
        assert!(!s.log_session(&event_ending_at(t(1500), 1500), t(1500)));
    }

    #[test]
    fn log_session_resolves_the_day_from_the_event_end() {
        let mut s = Scheduler::new(t(0));
        s.add_task("Today's work", t(0)).unwrap();
        // Ends two days later: that day has no schedule, so it drops.
        let far = t(0) + Duration::days(2);
        assert!(!s.log_session(&event_ending_at(far, 300), far));
        let task = &s.selected_day().unwrap().tasks[0];
        assert!(task.sessions.is_empty());
        assert_eq!(task.total_focus_seconds, 0);
    }

    #[test]
    fn selecting_an_unknown_day_synthesizes_it() {
        let mut s = Scheduler::new(t(0));
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let key = day_key(date);
        s.set_selected_day(&key, t(0));
        let day = s.selected_day().unwrap();
        assert_eq!(day.key, key);
        assert_eq!(day.date, date);
        assert!(day.tasks.is_empty());
    }

    #[test]
    fn selecting_an_unparseable_key_falls_back_to_now() {
        let mut s = Scheduler::new(t(0));
        s.set_selected_day("scratchpad", t(0));
        let day = s.selected_day().unwrap();
        assert_eq!(day.date, t(0).with_timezone(&Local).date_naive());
    }

    #[test]
    fn deleting_the_selected_day_falls_back_to_today() {
        let mut s = Scheduler::new(t(0));
        let key = day_key(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        s.set_selected_day(&key, t(0));
        assert!(s.delete_day(&key, t(0)));
        assert_eq!(s.selected_key(), day_key_for(t(0)));
    }

    #[test]
    fn deleting_the_selected_day_falls_back_to_most_recent_without_today() {
        let mut s = Scheduler::new(t(0));
        let older = day_key(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        let newer = day_key(NaiveDate::from_ymd_opt(2025, 2, 3).unwrap());
        s.set_selected_day(&older, t(0));
        s.set_selected_day(&newer, t(0));
        let today = day_key_for(t(0));
        s.delete_day(&today, t(0));
        s.set_selected_day(&newer, t(0));
        assert!(s.delete_day(&newer, t(0)));
        assert_eq!(s.selected_key(), older);
    }

    #[test]
    fn clear_schedule_leaves_an_empty_today() {
        let mut s = Scheduler::new(t(0));
        s.add_task("Doomed", t(0)).unwrap();
        s.set_selected_day("Monday 06.01.2025", t(0));
        s.clear_schedule(t(10));
        assert_eq!(s.days().len(), 1);
        assert_eq!(s.selected_key(), day_key_for(t(10)));
        assert!(s.selected_day().unwrap().tasks.is_empty());
    }

    #[test]
    fn from_parts_drops_a_dangling_activation() {
        let mut s = Scheduler::new(t(0));
        s.add_task("Task", t(0)).unwrap();
        let mut days = s.days().clone();
        for day in days.values_mut() {
            day.active_task_id = Some("gone".to_string());
        }
        let restored = Scheduler::from_parts(days, Some(s.selected_key().to_string()), t(100));
        let day = restored.selected_day().unwrap();
        assert!(day.active_task_id.is_none());
        assert_eq!(running_count(day), 0);
    }

    #[test]
    fn from_parts_keeps_a_running_stopwatch() {
        let mut s = Scheduler::new(t(0));
        let id = s.add_task("Still running", t(0)).unwrap();
        let restored =
            Scheduler::from_parts(s.days().clone(), Some(s.selected_key().to_string()), t(60));
        let day = restored.selected_day().unwrap();
        assert_eq!(day.active_task_id.as_deref(), Some(id.as_str()));
        assert!(day.task(&id).unwrap().timer_running());
    }

    #[test]
    fn at_most_one_stopwatch_runs_after_any_mutation() {
        let mut s = Scheduler::new(t(0));
        let a = s.add_task("A", t(0)).unwrap();
        let b = s.add_task("B", t(1)).unwrap();
        let c = s.add_task("C", t(2)).unwrap();
        s.set_active_task(Some(&b), t(3));
        s.delete_task(&b, t(4));
        s.set_active_task(Some(&c), t(5));
        s.set_active_task(Some(&a), t(6));
        assert!(running_count(s.selected_day().unwrap()) <= 1);
    }
}
