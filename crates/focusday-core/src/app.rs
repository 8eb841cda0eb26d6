//! Application shell.
//!
//! Wires the countdown engine, the day-keyed scheduler, the injected
//! store, and the notifier together: hydrates persisted state at
//! construction, re-serializes after every mutation, and routes each
//! `SessionEvent` the engine emits into the scheduler's ledger.
//!
//! Persistence is strictly best-effort. A malformed stored value falls
//! back to defaults on load; a failed write is logged and ignored, and
//! the in-memory state stays authoritative for the rest of the session.
//! Writes are suppressed until hydration completes so a failed load can
//! never clobber stored state with defaults.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::events::SessionEvent;
use crate::notify::{Notification, Notifier, NullNotifier};
use crate::schedule::{DaySchedule, Scheduler};
use crate::storage::{KvStore, ENGINE_KEY, SCHEDULE_KEY, SELECTED_DAY_KEY, SETTINGS_KEY};
use crate::timer::{TimerEngine, TimerSettings, TimerSettingsPatch};

/// The composed application state.
pub struct App<S: KvStore> {
    engine: TimerEngine,
    scheduler: Scheduler,
    store: S,
    notifier: Box<dyn Notifier>,
    hydrated: bool,
}

fn load_json<S: KvStore, T: DeserializeOwned>(store: &S, key: &str) -> Option<T> {
    match store.get(key) {
        Ok(Some(json)) => match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "malformed persisted state, using defaults");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(key, error = %e, "failed to read persisted state");
            None
        }
    }
}

impl<S: KvStore> App<S> {
    pub fn new(store: S) -> Self {
        Self::with_notifier(store, Box::new(NullNotifier))
    }

    pub fn with_notifier(store: S, notifier: Box<dyn Notifier>) -> Self {
        Self::hydrate_at(store, notifier, Utc::now())
    }

    /// Load persisted state, tolerating missing or malformed values.
    pub fn hydrate_at(store: S, notifier: Box<dyn Notifier>, now: DateTime<Utc>) -> Self {
        let settings = load_json::<S, TimerSettings>(&store, SETTINGS_KEY)
            .map(|mut s| {
                s.sanitize();
                s
            })
            .unwrap_or_default();
        let engine = load_json::<S, TimerEngine>(&store, ENGINE_KEY)
            .map(|mut e| {
                // The settings key is authoritative over the snapshot.
                e.set_settings_at(settings.clone(), now);
                e
            })
            .unwrap_or_else(|| TimerEngine::new(settings));
        let days =
            load_json::<S, HashMap<String, DaySchedule>>(&store, SCHEDULE_KEY).unwrap_or_default();
        let selected = load_json::<S, String>(&store, SELECTED_DAY_KEY);
        let scheduler = Scheduler::from_parts(days, selected, now);

        let mut app = Self {
            engine,
            scheduler,
            store,
            notifier,
            hydrated: true,
        };
        app.persist();
        app
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn settings(&self) -> &TimerSettings {
        self.engine.settings()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Timer operations ─────────────────────────────────────────────

    pub fn timer_start(&mut self, now: DateTime<Utc>) {
        self.engine.start_at(now);
        self.persist();
    }

    pub fn timer_pause(&mut self, now: DateTime<Utc>) {
        self.engine.pause_at(now);
        self.persist();
    }

    pub fn timer_reset(&mut self) {
        self.engine.reset();
        self.persist();
    }

    pub fn timer_skip(&mut self, now: DateTime<Utc>) -> SessionEvent {
        let event = self.engine.skip_at(now);
        self.handle_session(&event, now);
        self.persist();
        event
    }

    /// Advance the countdown against the wall clock, folding a completed
    /// interval into the ledger.
    pub fn timer_tick(&mut self, now: DateTime<Utc>) -> Option<SessionEvent> {
        let event = self.engine.tick_at(now);
        if let Some(ref event) = event {
            self.handle_session(event, now);
        }
        self.persist();
        event
    }

    pub fn update_settings(&mut self, patch: &TimerSettingsPatch, now: DateTime<Utc>) {
        self.engine.update_settings_at(patch, now);
        self.persist();
    }

    // ── Schedule operations ──────────────────────────────────────────

    pub fn select_day(&mut self, key: &str, now: DateTime<Utc>) {
        self.scheduler.set_selected_day(key, now);
        self.persist();
    }

    pub fn add_task(&mut self, title: &str, now: DateTime<Utc>) -> Option<String> {
        let id = self.scheduler.add_task(title, now);
        self.persist();
        id
    }

    pub fn rename_task(&mut self, id: &str, title: &str, now: DateTime<Utc>) -> bool {
        let renamed = self.scheduler.update_task_title(id, title, now);
        self.persist();
        renamed
    }

    pub fn set_tracked_seconds(&mut self, id: &str, seconds: u64, now: DateTime<Utc>) -> bool {
        let updated = self.scheduler.set_tracked_seconds(id, seconds, now);
        self.persist();
        updated
    }

    pub fn delete_task(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        let deleted = self.scheduler.delete_task(id, now);
        self.persist();
        deleted
    }

    pub fn set_active_task(&mut self, id: Option<&str>, now: DateTime<Utc>) {
        self.scheduler.set_active_task(id, now);
        self.persist();
    }

    pub fn delete_day(&mut self, key: &str, now: DateTime<Utc>) -> bool {
        let deleted = self.scheduler.delete_day(key, now);
        self.persist();
        deleted
    }

    pub fn clear_schedule(&mut self, now: DateTime<Utc>) {
        self.scheduler.clear_schedule(now);
        self.persist();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn handle_session(&mut self, event: &SessionEvent, now: DateTime<Utc>) {
        self.scheduler.refresh_today(now);
        self.scheduler.log_session(event, now);
        if self.engine.settings().notifications_enabled {
            self.notifier.notify(&Notification::for_session(event));
        }
        if self.engine.settings().sound_enabled {
            self.notifier.chime();
        }
    }

    /// Mirror the whole state into the store. Failures are logged and
    /// swallowed; the in-memory state stays authoritative.
    fn persist(&mut self) {
        if !self.hydrated {
            return;
        }
        let entries = [
            (SETTINGS_KEY, serde_json::to_string(self.engine.settings())),
            (ENGINE_KEY, serde_json::to_string(&self.engine)),
            (SCHEDULE_KEY, serde_json::to_string(self.scheduler.days())),
            (
                SELECTED_DAY_KEY,
                serde_json::to_string(self.scheduler.selected_key()),
            ),
        ];
        for (key, json) in entries {
            match json {
                Ok(json) => {
                    if let Err(e) = self.store.set(key, &json) {
                        warn!(key, error = %e, "failed to persist state");
                    }
                }
                Err(e) => warn!(key, error = %e, "failed to serialize state"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::timer::TimerMode;
    use chrono::{Duration, TimeZone};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn app_at(store: MemoryStore, now: DateTime<Utc>) -> App<MemoryStore> {
        App::hydrate_at(store, Box::new(NullNotifier), now)
    }

    #[test]
    fn empty_store_hydrates_defaults() {
        let app = app_at(MemoryStore::new(), t(0));
        assert_eq!(app.settings().focus_minutes, 25);
        assert_eq!(app.engine().mode(), TimerMode::Focus);
        assert_eq!(app.scheduler().days().len(), 1);
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let mut store = MemoryStore::new();
        store.set(SETTINGS_KEY, "not json").unwrap();
        store.set(SCHEDULE_KEY, "[1, 2, 3]").unwrap();
        store.set(ENGINE_KEY, "{\"mode\": 7}").unwrap();
        let app = app_at(store, t(0));
        assert_eq!(app.settings().focus_minutes, 25);
        assert_eq!(app.scheduler().days().len(), 1);
    }

    #[test]
    fn mutations_survive_a_reload() {
        let mut app = app_at(MemoryStore::new(), t(0));
        let id = app.add_task("Write report", t(0)).unwrap();
        app.update_settings(
            &TimerSettingsPatch {
                focus_minutes: Some(50),
                ..Default::default()
            },
            t(1),
        );
        let reloaded = app_at(app.store().clone(), t(2));
        assert_eq!(reloaded.settings().focus_minutes, 50);
        let day = reloaded.scheduler().selected_day().unwrap();
        assert_eq!(day.task(&id).unwrap().title, "Write report");
        assert_eq!(day.active_task_id.as_deref(), Some(id.as_str()));
    }

    #[test]
    fn paused_countdown_survives_a_reload() {
        let mut app = app_at(MemoryStore::new(), t(0));
        app.timer_start(t(0));
        app.timer_pause(t(30));
        let reloaded = app_at(app.store().clone(), t(500));
        assert_eq!(reloaded.engine().time_left_secs(), 25 * 60 - 30);
        assert!(!reloaded.engine().is_running());
    }

    #[test]
    fn skip_folds_the_session_into_the_active_task() {
        let mut app = app_at(MemoryStore::new(), t(0));
        let id = app.add_task("Write report", t(0)).unwrap();
        app.timer_start(t(0));
        let event = app.timer_skip(t(3));
        assert_eq!(event.elapsed_secs, 3);
        let task = app.scheduler().selected_day().unwrap().task(&id).unwrap();
        assert_eq!(task.sessions.len(), 1);
        assert_eq!(task.total_focus_seconds, 3);
    }

    #[test]
    fn skip_without_an_active_task_is_dropped() {
        let mut app = app_at(MemoryStore::new(), t(0));
        app.timer_start(t(0));
        app.timer_skip(t(3));
        let day = app.scheduler().selected_day().unwrap();
        assert!(day.tasks.is_empty());
    }

    #[test]
    fn hydration_does_not_clobber_existing_state() {
        let mut app = app_at(MemoryStore::new(), t(0));
        app.add_task("Keep me", t(0)).unwrap();
        let reloaded = app_at(app.store().clone(), t(10));
        let json = reloaded.store().get(SCHEDULE_KEY).unwrap().unwrap();
        assert!(json.contains("Keep me"));
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        notes: Rc<RefCell<Vec<Notification>>>,
        chimes: Rc<RefCell<usize>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, note: &Notification) {
            self.notes.borrow_mut().push(note.clone());
        }
        fn chime(&self) {
            *self.chimes.borrow_mut() += 1;
        }
    }

    #[test]
    fn completed_interval_notifies_and_chimes() {
        let recorder = RecordingNotifier::default();
        let mut app =
            App::hydrate_at(MemoryStore::new(), Box::new(recorder.clone()), t(0));
        app.timer_start(t(0));
        app.timer_tick(t(25 * 60));
        assert_eq!(recorder.notes.borrow().len(), 1);
        assert_eq!(recorder.notes.borrow()[0].title, "Focus complete");
        assert_eq!(*recorder.chimes.borrow(), 1);
    }

    #[test]
    fn disabled_notifications_stay_silent() {
        let recorder = RecordingNotifier::default();
        let mut app =
            App::hydrate_at(MemoryStore::new(), Box::new(recorder.clone()), t(0));
        app.update_settings(
            &TimerSettingsPatch {
                notifications_enabled: Some(false),
                sound_enabled: Some(false),
                ..Default::default()
            },
            t(0),
        );
        app.timer_start(t(0));
        app.timer_tick(t(25 * 60));
        assert!(recorder.notes.borrow().is_empty());
        assert_eq!(*recorder.chimes.borrow(), 0);
    }
}
