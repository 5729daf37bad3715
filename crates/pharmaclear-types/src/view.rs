// Render-facing snapshots. Each component produces its own slice; the
// orchestrator composes them into a DashboardView.

use crate::{ChatMessage, HistoryEntry, Notification, SearchResultSet, WatchlistItem};
use serde::Serialize;
use std::sync::Arc;

/// Progress of a section's initial load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            LoadStatus::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchView {
    pub query: Option<String>,
    pub results: Option<Arc<SearchResultSet>>,
    pub pending: bool,
    pub error: Option<String>,
}

impl SearchView {
    /// A search completed and matched nothing
    pub fn no_results(&self) -> bool {
        !self.pending
            && self.error.is_none()
            && self.results.as_ref().map(|r| r.is_empty()).unwrap_or(false)
    }

    pub fn total(&self) -> usize {
        self.results.as_ref().map(|r| r.total).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryView {
    pub entries: Vec<HistoryEntry>,
    pub status: LoadStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WatchlistView {
    pub items: Vec<WatchlistItem>,
    pub status: LoadStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatView {
    pub messages: Vec<ChatMessage>,
    pub in_flight: bool,
    /// A question can be sent right now
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NotificationView {
    pub items: Vec<Notification>,
    pub unread_count: usize,
    pub visible: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportView {
    pub enabled: bool,
    pub generating: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardView {
    pub search: SearchView,
    pub history: HistoryView,
    pub watchlist: WatchlistView,
    pub chat: ChatView,
    pub notifications: NotificationView,
    pub report: ReportView,
}
