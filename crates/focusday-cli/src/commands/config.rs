//! Timer settings commands.

use chrono::Utc;
use clap::Subcommand;
use focusday_core::TimerSettingsPatch;

use crate::common::open_app;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the current timer settings
    Show,
    /// Update timer settings; omitted options keep their value
    Set {
        /// Focus interval length in minutes
        #[arg(long)]
        focus: Option<u32>,
        /// Break interval length in minutes
        #[arg(long = "break")]
        break_minutes: Option<u32>,
        /// Long break interval length in minutes
        #[arg(long = "long-break")]
        long_break: Option<u32>,
        /// Completed focus intervals between long breaks
        #[arg(long = "long-break-interval")]
        long_break_interval: Option<u32>,
        /// Enable or disable long breaks
        #[arg(long = "enable-long-break")]
        enable_long_break: Option<bool>,
        /// Enable or disable the chime
        #[arg(long)]
        sound: Option<bool>,
        /// Enable or disable notifications
        #[arg(long)]
        notifications: Option<bool>,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app()?;

    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(app.settings())?);
        }
        ConfigAction::Set {
            focus,
            break_minutes,
            long_break,
            long_break_interval,
            enable_long_break,
            sound,
            notifications,
        } => {
            let patch = TimerSettingsPatch {
                focus_minutes: focus,
                break_minutes,
                long_break_minutes: long_break,
                enable_long_break,
                long_break_interval,
                sound_enabled: sound,
                notifications_enabled: notifications,
            };
            app.update_settings(&patch, Utc::now());
            println!("{}", serde_json::to_string_pretty(app.settings())?);
        }
    }

    Ok(())
}
