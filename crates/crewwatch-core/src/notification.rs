use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::CrewError;
use crate::model::CommandKind;

/// Default auto-dismiss duration for a notification in seconds.
pub const DEFAULT_NOTIFICATION_TTL_SECS: u64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// An operator-facing message with a bounded lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Increases with every publish so a presenter can tell replacements apart.
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub visible: bool,
}

impl Notification {
    pub fn command_succeeded(kind: CommandKind) -> (String, Severity) {
        let message = match kind {
            CommandKind::Start => "Crew started successfully",
            CommandKind::Stop => "Crew stopped successfully",
        };
        (message.to_string(), Severity::Success)
    }

    pub fn command_failed(kind: CommandKind, error: &CrewError) -> (String, Severity) {
        (format!("Failed to {kind} crew: {error}"), Severity::Error)
    }

    pub fn disconnected() -> (String, Severity) {
        (
            "Failed to connect to the crew engine. Make sure the backend is running.".to_string(),
            Severity::Error,
        )
    }
}

/// Holds at most one notification. Newer always preempts older.
#[derive(Debug)]
pub struct NotificationSink {
    current: Option<Notification>,
    deadline: Option<Instant>,
    ttl: Duration,
    next_id: u64,
}

impl NotificationSink {
    pub fn new(ttl: Duration) -> Self {
        Self {
            current: None,
            deadline: None,
            ttl,
            next_id: 1,
        }
    }

    /// Replace whatever is showing and restart the dismiss timer.
    pub fn publish(&mut self, message: String, severity: Severity, now: Instant) -> &Notification {
        let id = self.next_id;
        self.next_id += 1;
        self.deadline = Some(now + self.ttl);
        self.current.insert(Notification {
            id,
            message,
            severity,
            visible: true,
        })
    }

    pub fn dismiss(&mut self) {
        if let Some(n) = self.current.as_mut() {
            n.visible = false;
        }
        self.deadline = None;
    }

    /// Hide the notification once its deadline has passed. Returns true if
    /// it was hidden by this call.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.dismiss();
                true
            },
            _ => false,
        }
    }

    /// When the visible notification auto-dismisses, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The visible notification.
    pub fn visible(&self) -> Option<&Notification> {
        self.current.as_ref().filter(|n| n.visible)
    }
}

impl Default for NotificationSink {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_NOTIFICATION_TTL_SECS))
    }
}
