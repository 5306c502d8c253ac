// Notifications - user-facing status lines, mirrored into the log

use crate::messaging::channels::NotificationProducer;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

impl NotificationLevel {
    fn log_level(self) -> log::Level {
        match self {
            NotificationLevel::Info => log::Level::Info,
            NotificationLevel::Warning => log::Level::Warn,
            NotificationLevel::Error => log::Level::Error,
        }
    }
}

/// Part of the machine a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Audio,
    Transport,
    Storage,
}

/// One line for the status bar
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub category: NotificationCategory,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        level: NotificationLevel,
        category: NotificationCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            category,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn info(category: NotificationCategory, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, category, message)
    }

    pub fn warning(category: NotificationCategory, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, category, message)
    }

    pub fn error(category: NotificationCategory, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, category, message)
    }

    /// Still worth showing after `max_age`
    pub fn is_recent(&self, max_age: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.created_at);
        age.to_std().map_or(true, |age| age < max_age)
    }
}

/// Log a notification and queue it for the UI
///
/// Never blocks: when the queue is busy or full the UI misses it, the log
/// still has it. Not for the audio callback, logging may allocate.
pub fn notify(tx: &Arc<Mutex<NotificationProducer>>, notification: Notification) {
    log::log!(
        notification.level.log_level(),
        "[{:?}] {}",
        notification.category,
        notification.message
    );
    if let Ok(mut tx) = tx.try_lock() {
        let _ = ringbuf::traits::Producer::try_push(&mut *tx, notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::channels::create_notification_channel;

    #[test]
    fn test_notification_helpers() {
        let info = Notification::info(NotificationCategory::Audio, "Audio connected");
        let warning = Notification::warning(NotificationCategory::Storage, "State not saved");
        let error = Notification::error(NotificationCategory::Transport, format!("code {}", 3));

        assert_eq!(info.level, NotificationLevel::Info);
        assert_eq!(warning.level, NotificationLevel::Warning);
        assert_eq!(error.level, NotificationLevel::Error);
        assert_eq!(error.category, NotificationCategory::Transport);
        assert_eq!(error.message, "code 3");
    }

    #[test]
    fn test_notification_expires() {
        let mut notif = Notification::info(NotificationCategory::Audio, "Test");
        assert!(notif.is_recent(Duration::from_secs(1)));

        notif.created_at = Utc::now() - chrono::Duration::seconds(10);
        assert!(!notif.is_recent(Duration::from_secs(5)));
    }

    #[test]
    fn test_notify_pushes_to_channel() {
        let (tx, mut rx) = create_notification_channel(4);
        let tx = Arc::new(Mutex::new(tx));

        notify(
            &tx,
            Notification::warning(NotificationCategory::Transport, "hello"),
        );

        let received = ringbuf::traits::Consumer::try_pop(&mut rx);
        assert_eq!(received.map(|n| n.message), Some("hello".to_string()));
    }

    #[test]
    fn test_notify_drops_when_full() {
        let (tx, mut rx) = create_notification_channel(1);
        let tx = Arc::new(Mutex::new(tx));

        notify(&tx, Notification::info(NotificationCategory::Audio, "first"));
        notify(&tx, Notification::info(NotificationCategory::Audio, "second"));

        let received = ringbuf::traits::Consumer::try_pop(&mut rx);
        assert_eq!(received.map(|n| n.message), Some("first".to_string()));
        assert!(ringbuf::traits::Consumer::try_pop(&mut rx).is_none());
    }
}
