//! Notifications for a terminal host: one JSON line per notification on stdout.

use std::io::Write;

use chrono::Utc;
use finite_core::{Event, Notifier, NotifyError};

pub struct TerminalNotifier {
    enabled: bool,
}

impl TerminalNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Notifier for TerminalNotifier {
    async fn request_permission(&self) -> bool {
        self.enabled
    }

    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let event = Event::NotificationShown {
            title: title.to_string(),
            body: body.to_string(),
            at: Utc::now(),
        };
        let line =
            serde_json::to_string(&event).map_err(|e| NotifyError::Delivery(e.to_string()))?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}").map_err(|e| NotifyError::Delivery(e.to_string()))?;
        out.flush().map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}
