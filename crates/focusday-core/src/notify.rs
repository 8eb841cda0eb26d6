//! Notification collaborators.
//!
//! The core never talks to a notification backend directly; it hands a
//! [`Notification`] to whatever [`Notifier`] was injected. Delivery is
//! best-effort: implementations log failures and swallow them, so a
//! missing capability can never stop the timer.

use crate::events::SessionEvent;
use crate::timer::TimerMode;

/// A best-effort desktop/terminal notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub tag: String,
}

impl Notification {
    /// The message announcing a completed interval.
    pub fn for_session(event: &SessionEvent) -> Self {
        let (title, body) = match event.mode {
            TimerMode::Focus => ("Focus complete", "Time for a break."),
            TimerMode::Break => ("Break over", "Back to focus."),
            TimerMode::LongBreak => ("Long break over", "Ready for the next round."),
        };
        Self {
            title: title.to_string(),
            body: body.to_string(),
            tag: "focusday-session".to_string(),
        }
    }
}

/// Fire-and-forget notification capability.
pub trait Notifier {
    fn notify(&self, note: &Notification);
    fn chime(&self);
}

/// Notifier that does nothing. Default collaborator for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _note: &Notification) {}
    fn chime(&self) {}
}
