//! # Focusday Core Library
//!
//! Core business logic for Focusday, a local-first Pomodoro timer with
//! per-task, per-day time tracking. All operations are available through
//! the standalone CLI binary; this crate owns every state machine and the
//! persistence, and the CLI is a thin command layer over it.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a wall-clock-based countdown state machine that
//!   requires the caller to periodically invoke `tick()`; each completed
//!   or skipped interval yields one [`SessionEvent`]
//! - **Scheduler**: the day-keyed task ledger folding those events into
//!   the active task, plus an exclusive per-day stopwatch
//! - **Storage**: a key-value store (SQLite-backed) holding the state as
//!   JSON, injected behind the [`KvStore`] trait
//! - **App**: the shell wiring the pieces together and mirroring every
//!   mutation back into the store
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core countdown state machine
//! - [`Scheduler`]: day-keyed task ledger
//! - [`App`]: composed application state
//! - [`Database`]: SQLite persistence

pub mod app;
pub mod error;
pub mod events;
pub mod notify;
pub mod schedule;
pub mod storage;
pub mod timer;

pub use app::App;
pub use error::{CoreError, Result, StorageError};
pub use events::{SessionEvent, TimerSnapshot};
pub use notify::{Notification, Notifier, NullNotifier};
pub use schedule::{day_key, day_key_for, display_tracked_seconds, DaySchedule, Scheduler, SessionRecord, TaskEntry};
pub use storage::{Database, KvStore, MemoryStore};
pub use timer::{TimerEngine, TimerMode, TimerSettings, TimerSettingsPatch};
