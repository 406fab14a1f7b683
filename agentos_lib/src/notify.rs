//! Non-blocking user notifications (the console's toasts).

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Which interaction produced the notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSource {
    List,
    Action,
    Detail,
    Validation,
}

#[derive(Clone, Debug, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub source: NotificationSource,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Fan-out of notifications to any number of subscribers.
///
/// Sending never waits: with no subscriber the message is only logged, and
/// a lagging subscriber loses the oldest entries.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn notify(&self, level: NotificationLevel, source: NotificationSource, message: String) {
        match level {
            NotificationLevel::Error => tracing::warn!(?source, "{}", message),
            _ => tracing::info!(?source, "{}", message),
        }
        let _ = self.tx.send(Notification {
            level,
            source,
            message,
            at: Utc::now(),
        });
    }

    pub fn success(&self, source: NotificationSource, message: impl Into<String>) {
        self.notify(NotificationLevel::Success, source, message.into());
    }

    pub fn error(&self, source: NotificationSource, message: impl Into<String>) {
        self.notify(NotificationLevel::Error, source, message.into());
    }
}
