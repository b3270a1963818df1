use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::models::VideoId;

/// Maximum number of notifications retained.
const NOTIFICATION_LOG_CAPACITY: usize = 50;

/// A user-facing message about one failed open attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub at: DateTime<Utc>,
    pub video_id: Option<VideoId>,
    pub message: String,
}

/// Bounded log of pending notifications. Each can be dismissed on its own.
#[derive(Debug)]
pub struct NotificationLog {
    entries: VecDeque<Notification>,
    next_id: u64,
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(NOTIFICATION_LOG_CAPACITY),
            next_id: 1,
        }
    }

    /// Push a notification, dropping the oldest if at capacity.
    pub fn push(&mut self, video_id: Option<VideoId>, message: impl Into<String>) -> Notification {
        if self.entries.len() >= NOTIFICATION_LOG_CAPACITY {
            self.entries.pop_front();
        }
        let notification = Notification {
            id: self.next_id,
            at: Utc::now(),
            video_id,
            message: message.into(),
        };
        self.next_id += 1;
        self.entries.push_back(notification.clone());
        notification
    }

    /// Remove a notification by id. Returns `false` if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|n| n.id != id);
        self.entries.len() != before
    }

    /// Snapshot of all pending notifications (newest last).
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_dismiss() {
        let mut log = NotificationLog::new();
        let first = log.push(None, "could not open");
        let second = log.push(None, "again");
        assert_eq!(log.len(), 2);

        assert!(log.dismiss(first.id));
        assert!(!log.dismiss(first.id));
        assert_eq!(log.snapshot(), vec![second]);
    }

    #[test]
    fn test_bounded() {
        let mut log = NotificationLog::new();
        for i in 0..NOTIFICATION_LOG_CAPACITY + 5 {
            log.push(None, format!("failure {i}"));
        }
        assert_eq!(log.len(), NOTIFICATION_LOG_CAPACITY);
        assert_eq!(log.snapshot()[0].message, "failure 5");
    }
}
