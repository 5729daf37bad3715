use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An entry of the notification feed.
///
/// `is_read` only ever moves from false to true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub message: String,
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
}

impl Notification {
    pub fn new(id: i64, message: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            message: message.into(),
            created_at,
            is_read: false,
        }
    }

    pub fn mark_read(&mut self) {
        self.is_read = true;
    }
}
