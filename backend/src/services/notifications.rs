//! Transient user-facing notifications.
//!
//! A bounded, in-memory log of toasts. Failures of remote operations are
//! reported here; the grid itself stays interactive.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single notification with timestamp and message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: NotificationLevel,
    pub message: String,
}

/// In-memory notification log. Oldest entries are dropped past `capacity`.
#[derive(Clone)]
pub struct NotificationCenter {
    entries: Arc<RwLock<VecDeque<Notification>>>,
    capacity: usize,
}

impl NotificationCenter {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Add a notification and return its id.
    pub fn push(&self, level: NotificationLevel, message: impl Into<String>) -> Uuid {
        let notification = Notification {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level,
            message: message.into(),
        };
        let id = notification.id;
        let mut entries = self.entries.write();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(notification);
        id
    }

    pub fn info(&self, message: impl Into<String>) -> Uuid {
        self.push(NotificationLevel::Info, message)
    }

    pub fn success(&self, message: impl Into<String>) -> Uuid {
        self.push(NotificationLevel::Success, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> Uuid {
        self.push(NotificationLevel::Warning, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.push(NotificationLevel::Error, message)
    }

    /// Up to `limit` notifications, newest first.
    pub fn recent(&self, limit: usize) -> Vec<Notification> {
        self.entries.read().iter().rev().take(limit).cloned().collect()
    }

    /// Remove and return everything, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        self.entries.write().drain(..).collect()
    }

    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|n| n.id != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(50)
    }
}
