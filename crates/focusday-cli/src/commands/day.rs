//! Day schedule commands.

use chrono::Utc;
use clap::Subcommand;

use crate::common::open_app;

#[derive(Subcommand)]
pub enum DayAction {
    /// Switch the selected day, creating its schedule if needed
    Select {
        /// Day key, e.g. "Monday 10.03.2025"
        key: String,
    },
    /// List all days, most recent first
    List,
    /// Delete a day's schedule
    Delete {
        /// Day key
        key: String,
    },
    /// Drop the whole schedule, keeping an empty today
    Clear,
}

pub fn run(action: DayAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app()?;
    let now = Utc::now();

    match action {
        DayAction::Select { key } => {
            app.select_day(&key, now);
            println!("Selected: {}", app.scheduler().selected_key());
        }
        DayAction::List => {
            let days: Vec<serde_json::Value> = app
                .scheduler()
                .days_sorted()
                .into_iter()
                .map(|day| {
                    serde_json::json!({
                        "key": day.key,
                        "date": day.date,
                        "tasks": day.tasks.len(),
                        "selected": day.key == app.scheduler().selected_key(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&days)?);
        }
        DayAction::Delete { key } => {
            if app.delete_day(&key, now) {
                println!("Deleted: {key}");
                println!("Selected: {}", app.scheduler().selected_key());
            } else {
                println!("Day not found: {key}");
            }
        }
        DayAction::Clear => {
            app.clear_schedule(now);
            println!("Schedule cleared");
            println!("Selected: {}", app.scheduler().selected_key());
        }
    }

    Ok(())
}
