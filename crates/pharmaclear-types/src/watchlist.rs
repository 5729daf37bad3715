use serde::{Deserialize, Serialize};

/// A saved query the user wants to be alerted about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub id: i64,
    pub query_text: String,
}

impl WatchlistItem {
    pub fn new(id: i64, query_text: impl Into<String>) -> Self {
        Self {
            id,
            query_text: query_text.into(),
        }
    }

    /// Case-insensitive comparison key
    pub fn key(&self) -> String {
        normalize_query(&self.query_text)
    }
}

/// Key used for watchlist uniqueness: trimmed and lower-cased
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}
