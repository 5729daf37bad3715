use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A past query, as confirmed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub query_text: String,
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(id: i64, query_text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            query_text: query_text.into(),
            created_at,
        }
    }
}
