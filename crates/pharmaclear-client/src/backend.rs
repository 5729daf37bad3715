use crate::credential::BearerToken;
use crate::error::Result;
use async_trait::async_trait;
use pharmaclear_types::{AlertContext, HistoryEntry, Notification, SearchResultSet, WatchlistItem};
use serde::{Deserialize, Serialize};

/// Optional paging for search-alerts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub database: Option<String>,
}

/// Every call the dashboard makes against its backend.
///
/// Authenticated calls take the bearer token explicitly; implementations
/// never read credentials from anywhere else.
#[async_trait]
pub trait DashboardBackend: Send + Sync {
    /// Exchange username/password for an access token
    async fn issue_token(&self, username: &str, password: &str) -> Result<TokenResponse>;

    /// Run a query against the alert corpus
    async fn search_alerts(
        &self,
        token: &BearerToken,
        query: &str,
        params: SearchParams,
    ) -> Result<SearchResultSet>;

    async fn list_search_history(&self, token: &BearerToken) -> Result<Vec<HistoryEntry>>;

    async fn record_search(&self, token: &BearerToken, query: &str) -> Result<HistoryEntry>;

    async fn list_watchlist(&self, token: &BearerToken) -> Result<Vec<WatchlistItem>>;

    async fn add_watchlist(&self, token: &BearerToken, query: &str) -> Result<WatchlistItem>;

    async fn remove_watchlist(&self, token: &BearerToken, id: i64) -> Result<()>;

    /// Ask the assistant a question about the given alerts; returns the answer text
    async fn send_chat(
        &self,
        token: &BearerToken,
        question: &str,
        context_alerts: &[AlertContext],
    ) -> Result<String>;

    async fn list_notifications(&self, token: &BearerToken) -> Result<Vec<Notification>>;

    async fn mark_notifications_read(&self, token: &BearerToken) -> Result<()>;

    /// Render a PDF report; returns the raw document bytes
    async fn generate_report(
        &self,
        token: &BearerToken,
        query: &str,
        alerts: &[AlertContext],
    ) -> Result<Vec<u8>>;

    async fn health(&self) -> Result<HealthStatus>;
}
