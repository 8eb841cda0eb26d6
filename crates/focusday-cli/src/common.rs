//! Shared helpers for CLI commands.

use std::io::Write;

use focusday_core::{App, Database, Notification, Notifier};

/// Notifier for terminal use: messages go to stderr, the chime is the
/// terminal bell.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, note: &Notification) {
        eprintln!("{}: {}", note.title, note.body);
    }

    fn chime(&self) {
        print!("\x07");
        let _ = std::io::stdout().flush();
    }
}

/// Open the on-disk store and hydrate the application state.
pub fn open_app() -> Result<App<Database>, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    Ok(App::with_notifier(db, Box::new(TerminalNotifier)))
}
