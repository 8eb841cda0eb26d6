//! Timer control commands.

use chrono::Utc;
use clap::Subcommand;

use crate::common::open_app;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the countdown
    Start,
    /// Pause the countdown without losing remaining time
    Pause,
    /// Skip to the next interval, crediting only the time that ran
    Skip,
    /// Hard reset: fresh focus interval, counter cleared
    Reset,
    /// Advance against the wall clock and print the current state
    Status,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app()?;
    let now = Utc::now();

    match action {
        TimerAction::Start => {
            app.timer_start(now);
            println!(
                "{}",
                serde_json::to_string_pretty(&app.engine().snapshot_at(now))?
            );
        }
        TimerAction::Pause => {
            app.timer_pause(now);
            println!(
                "{}",
                serde_json::to_string_pretty(&app.engine().snapshot_at(now))?
            );
        }
        TimerAction::Skip => {
            let event = app.timer_skip(now);
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::Reset => {
            app.timer_reset();
            println!(
                "{}",
                serde_json::to_string_pretty(&app.engine().snapshot_at(now))?
            );
        }
        TimerAction::Status => {
            let completed = app.timer_tick(now);
            println!(
                "{}",
                serde_json::to_string_pretty(&app.engine().snapshot_at(now))?
            );
            if let Some(event) = completed {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
        }
    }

    Ok(())
}
