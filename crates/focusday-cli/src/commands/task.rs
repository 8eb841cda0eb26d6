//! Task management commands for the selected day.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use focusday_core::{App, Database, DaySchedule};

use crate::common::open_app;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task; the first task of an empty day starts tracking
    Add {
        /// Task title
        title: String,
    },
    /// List the selected day's tasks with live tracked time
    List,
    /// Rename a task
    Rename {
        /// Task ID
        id: String,
        /// New title
        title: String,
    },
    /// Overwrite a task's tracked seconds (stopwatch must be stopped)
    Track {
        /// Task ID
        id: String,
        /// Tracked time in seconds
        seconds: u64,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Attach the stopwatch to a task
    Start {
        /// Task ID
        id: String,
    },
    /// Stop the running stopwatch
    Stop,
}

fn print_day(day: &DaySchedule, now: DateTime<Utc>) -> Result<(), Box<dyn std::error::Error>> {
    let tasks: Vec<serde_json::Value> = day
        .tasks
        .iter()
        .map(|task| {
            serde_json::json!({
                "id": task.id,
                "title": task.title,
                "total_focus_seconds": task.total_focus_seconds,
                "total_break_seconds": task.total_break_seconds,
                "tracked_seconds": task.live_tracked_seconds(now),
                "running": task.timer_running(),
                "sessions": task.sessions.len(),
            })
        })
        .collect();
    let summary = serde_json::json!({
        "day": day.key,
        "active_task_id": day.active_task_id,
        "tasks": tasks,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn print_selected_day(
    app: &App<Database>,
    now: DateTime<Utc>,
) -> Result<(), Box<dyn std::error::Error>> {
    match app.scheduler().selected_day() {
        Some(day) => print_day(day, now),
        None => {
            println!("No schedule for the selected day");
            Ok(())
        }
    }
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app()?;
    let now = Utc::now();

    match action {
        TaskAction::Add { title } => match app.add_task(&title, now) {
            Some(id) => {
                println!("Task created: {id}");
                print_selected_day(&app, now)?;
            }
            None => return Err("task title must not be blank".into()),
        },
        TaskAction::List => print_selected_day(&app, now)?,
        TaskAction::Rename { id, title } => {
            if app.rename_task(&id, &title, now) {
                print_selected_day(&app, now)?;
            } else {
                println!("Task not renamed (unknown id or blank title): {id}");
            }
        }
        TaskAction::Track { id, seconds } => {
            if app.set_tracked_seconds(&id, seconds, now) {
                print_selected_day(&app, now)?;
            } else {
                return Err("tracked time can only be edited while the stopwatch is stopped".into());
            }
        }
        TaskAction::Delete { id } => {
            if app.delete_task(&id, now) {
                print_selected_day(&app, now)?;
            } else {
                println!("Task not found: {id}");
            }
        }
        TaskAction::Start { id } => {
            app.set_active_task(Some(&id), now);
            print_selected_day(&app, now)?;
        }
        TaskAction::Stop => {
            app.set_active_task(None, now);
            print_selected_day(&app, now)?;
        }
    }

    Ok(())
}
