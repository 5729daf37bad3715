use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CHAT_FALLBACK: &str = "Sorry, I encountered an error. Please retry.";

/// Behavioural settings for the dashboard components
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Seconds between notification feed refreshes
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Forwarded as `limit` on every search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_page_size: Option<u32>,
    /// Assistant turn appended when a chat request fails
    #[serde(default = "default_chat_fallback")]
    pub chat_fallback_message: String,
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_chat_fallback() -> String {
    DEFAULT_CHAT_FALLBACK.to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            search_page_size: None,
            chat_fallback_message: default_chat_fallback(),
        }
    }
}

impl DashboardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_secs = interval.as_secs().max(1);
        self
    }

    pub fn with_search_page_size(mut self, size: u32) -> Self {
        self.search_page_size = Some(size);
        self
    }

    pub fn with_chat_fallback(mut self, message: impl Into<String>) -> Self {
        self.chat_fallback_message = message.into();
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}
