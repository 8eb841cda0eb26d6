//! Persistence for the timer and the schedule.
//!
//! The application state mirrors into a small key-value store after every
//! mutation, the way the original mirrored into browser local storage.
//! Values are JSON strings under fixed keys. The store itself is injected
//! behind [`KvStore`] so the core stays testable without a real backend;
//! [`Database`] is the SQLite implementation and [`MemoryStore`] the
//! in-memory one.

pub mod database;

pub use database::Database;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::StorageError;

/// Key for the JSON-encoded `TimerSettings`.
pub const SETTINGS_KEY: &str = "timer_settings";
/// Key for the JSON-encoded day-key -> `DaySchedule` map.
pub const SCHEDULE_KEY: &str = "schedule";
/// Key for the JSON-encoded selected day key.
pub const SELECTED_DAY_KEY: &str = "selected_day";
/// Key for the JSON-encoded engine snapshot carried between invocations.
pub const ENGINE_KEY: &str = "timer_engine";

/// Minimal key-value persistence capability.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store for tests and for running without persistence.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Returns `~/.config/focusday[-dev]/` based on FOCUSDAY_ENV.
///
/// Set FOCUSDAY_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSDAY_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focusday-dev")
    } else {
        base_dir.join("focusday")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
