//! Time totals, aggregated from the ledger.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use focusday_core::DaySchedule;

use crate::common::open_app;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Totals for the selected day
    Show,
    /// Totals for every day, most recent first
    All,
}

fn day_totals(day: &DaySchedule, now: DateTime<Utc>) -> serde_json::Value {
    let focus: u64 = day.tasks.iter().map(|t| t.total_focus_seconds).sum();
    let breaks: u64 = day.tasks.iter().map(|t| t.total_break_seconds).sum();
    let tracked: u64 = day.tasks.iter().map(|t| t.live_tracked_seconds(now)).sum();
    let sessions: usize = day.tasks.iter().map(|t| t.sessions.len()).sum();
    serde_json::json!({
        "day": day.key,
        "tasks": day.tasks.len(),
        "sessions": sessions,
        "focus_seconds": focus,
        "break_seconds": breaks,
        "tracked_seconds": tracked,
    })
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = open_app()?;
    let now = Utc::now();

    match action {
        StatsAction::Show => match app.scheduler().selected_day() {
            Some(day) => println!("{}", serde_json::to_string_pretty(&day_totals(day, now))?),
            None => println!("No schedule for the selected day"),
        },
        StatsAction::All => {
            let rows: Vec<serde_json::Value> = app
                .scheduler()
                .days_sorted()
                .into_iter()
                .map(|day| day_totals(day, now))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}
