mod engine;
mod settings;

pub use engine::TimerEngine;
pub use settings::{TimerMode, TimerSettings, TimerSettingsPatch};
