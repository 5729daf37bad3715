// Scripted in-memory backend for dashboard tests.
//
// Every call is counted by endpoint name. A call can be held back with a
// gate (`gate("search:aspirin")`, `gate("send_chat")`, ...) until the test
// releases it with `notify_one()`, which lets tests choose the order in
// which overlapping responses resolve.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pharmaclear_client::{
    BearerToken, ClientError, DashboardBackend, HealthStatus, Result, SearchParams,
    SessionCredential, TokenResponse,
};
use pharmaclear_types::{
    Alert, AlertContext, HistoryEntry, Notification, SearchResultSet, Severity, WatchlistItem,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
struct FakeState {
    alerts: HashMap<String, Vec<Alert>>,
    failing: HashSet<String>,
    gates: HashMap<String, Arc<Notify>>,
    calls: HashMap<String, usize>,
    history: Vec<HistoryEntry>,
    watchlist: Vec<WatchlistItem>,
    notifications: Vec<Notification>,
    chat_contexts: Vec<Vec<AlertContext>>,
    search_params: Vec<SearchParams>,
    next_id: i64,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

pub fn credential() -> SessionCredential {
    SessionCredential::new(BearerToken::new("test-token"))
}

pub fn ibuprofen_alerts() -> Vec<Alert> {
    vec![
        Alert::new(
            "Ibuprofen Tablets 200mg",
            "Class I recall: tablets contaminated with metal fragments",
            Severity::High,
            "20240110",
        ),
        Alert::new(
            "Ibuprofen Oral Suspension",
            "Class II recall: incorrect dosing cup",
            Severity::Medium,
            "20240202",
        ),
        Alert::new(
            "Ibuprofen Gel Caps",
            "Labeling update for storage temperature",
            Severity::Low,
            "20240315",
        ),
    ]
}

pub fn notification(id: i64, message: &str) -> Notification {
    Notification::new(id, message, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
}

/// Yield until `check` holds; panics if it never does
pub async fn wait_until<F: Fn() -> bool>(check: F) {
    for _ in 0..1000 {
        if check() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().next_id = 100;
        backend
    }

    pub fn with_alerts(self, query: &str, alerts: Vec<Alert>) -> Self {
        self.state.lock().unwrap().alerts.insert(query.to_lowercase(), alerts);
        self
    }

    pub fn with_history(self, entries: Vec<HistoryEntry>) -> Self {
        self.state.lock().unwrap().history = entries;
        self
    }

    pub fn with_watchlist(self, items: Vec<WatchlistItem>) -> Self {
        self.state.lock().unwrap().watchlist = items;
        self
    }

    pub fn with_notifications(self, items: Vec<Notification>) -> Self {
        self.state.lock().unwrap().notifications = items;
        self
    }

    /// Make calls with this key fail (an endpoint name or `search:<query>`)
    pub fn fail(&self, key: &str) {
        self.state.lock().unwrap().failing.insert(key.to_string());
    }

    pub fn recover(&self, key: &str) {
        self.state.lock().unwrap().failing.remove(key);
    }

    /// Hold calls with this key until the returned gate is notified
    pub fn gate(&self, key: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state
            .lock()
            .unwrap()
            .gates
            .insert(key.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.state.lock().unwrap().calls.get(endpoint).copied().unwrap_or(0)
    }

    pub fn chat_contexts(&self) -> Vec<Vec<AlertContext>> {
        self.state.lock().unwrap().chat_contexts.clone()
    }

    pub fn search_params(&self) -> Vec<SearchParams> {
        self.state.lock().unwrap().search_params.clone()
    }

    pub fn server_watchlist(&self) -> Vec<WatchlistItem> {
        self.state.lock().unwrap().watchlist.clone()
    }

    /// Count the call, then wait on its gate and report whether it should fail
    async fn enter(&self, endpoint: &str, key: Option<&str>) -> Result<()> {
        let (gate, failing) = {
            let mut state = self.state.lock().unwrap();
            *state.calls.entry(endpoint.to_string()).or_default() += 1;

            let key = key.unwrap_or(endpoint);
            let gate = state.gates.get(key).cloned();
            let failing = state.failing.contains(endpoint) || state.failing.contains(key);
            (gate, failing)
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        if failing {
            Err(ClientError::Server {
                status: 500,
                message: format!("{} failed", endpoint),
            })
        } else {
            Ok(())
        }
    }

    fn next_id(&self) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        state.next_id
    }
}

#[async_trait]
impl DashboardBackend for FakeBackend {
    async fn issue_token(&self, username: &str, _password: &str) -> Result<TokenResponse> {
        self.enter("issue_token", None).await?;
        Ok(TokenResponse {
            access_token: format!("token-for-{}", username),
            token_type: "bearer".to_string(),
        })
    }

    async fn search_alerts(
        &self,
        _token: &BearerToken,
        query: &str,
        params: SearchParams,
    ) -> Result<SearchResultSet> {
        let key = format!("search:{}", query.to_lowercase());
        self.enter("search", Some(&key)).await?;

        let mut state = self.state.lock().unwrap();
        state.search_params.push(params);
        let alerts = state.alerts.get(&query.to_lowercase()).cloned().unwrap_or_default();
        let total = alerts.len();
        Ok(SearchResultSet::new(query, alerts, total))
    }

    async fn list_search_history(&self, _token: &BearerToken) -> Result<Vec<HistoryEntry>> {
        self.enter("list_search_history", None).await?;
        Ok(self.state.lock().unwrap().history.clone())
    }

    async fn record_search(&self, _token: &BearerToken, query: &str) -> Result<HistoryEntry> {
        self.enter("record_search", None).await?;
        let id = self.next_id();
        let entry = HistoryEntry::new(
            id,
            query,
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(id),
        );
        self.state.lock().unwrap().history.push(entry.clone());
        Ok(entry)
    }

    async fn list_watchlist(&self, _token: &BearerToken) -> Result<Vec<WatchlistItem>> {
        self.enter("list_watchlist", None).await?;
        Ok(self.state.lock().unwrap().watchlist.clone())
    }

    async fn add_watchlist(&self, _token: &BearerToken, query: &str) -> Result<WatchlistItem> {
        self.enter("add_watchlist", None).await?;
        let item = WatchlistItem::new(self.next_id(), query);
        self.state.lock().unwrap().watchlist.push(item.clone());
        Ok(item)
    }

    async fn remove_watchlist(&self, _token: &BearerToken, id: i64) -> Result<()> {
        self.enter("remove_watchlist", None).await?;
        self.state.lock().unwrap().watchlist.retain(|item| item.id != id);
        Ok(())
    }

    async fn send_chat(
        &self,
        _token: &BearerToken,
        question: &str,
        context_alerts: &[AlertContext],
    ) -> Result<String> {
        self.state
            .lock()
            .unwrap()
            .chat_contexts
            .push(context_alerts.to_vec());
        self.enter("send_chat", None).await?;

        if question.to_lowercase().contains("high") {
            let high: Vec<&str> = context_alerts
                .iter()
                .filter(|alert| alert.severity == Severity::High)
                .map(|alert| alert.description.as_str())
                .collect();
            return Ok(format!(
                "{} alert(s) were high severity: {}",
                high.len(),
                high.join("; ")
            ));
        }

        Ok(format!("There are {} alerts in this result set.", context_alerts.len()))
    }

    async fn list_notifications(&self, _token: &BearerToken) -> Result<Vec<Notification>> {
        self.enter("list_notifications", None).await?;
        Ok(self.state.lock().unwrap().notifications.clone())
    }

    async fn mark_notifications_read(&self, _token: &BearerToken) -> Result<()> {
        self.enter("mark_notifications_read", None).await?;
        for notification in self.state.lock().unwrap().notifications.iter_mut() {
            notification.mark_read();
        }
        Ok(())
    }

    async fn generate_report(
        &self,
        _token: &BearerToken,
        query: &str,
        alerts: &[AlertContext],
    ) -> Result<Vec<u8>> {
        self.enter("generate_report", None).await?;
        Ok(format!("%PDF-1.4 {} ({} alerts)", query, alerts.len()).into_bytes())
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.enter("health", None).await?;
        Ok(HealthStatus {
            status: "ok".to_string(),
            database: Some("connected".to_string()),
        })
    }
}

pub const POLL: Duration = Duration::from_secs(60);
