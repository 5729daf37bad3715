// The dashboard as a whole: routes user intents to the owning component and
// composes their views. Components never read each other's state; every
// cross-component effect (chat reset, history recording) happens here.

use crate::chat::{ChatOutcome, ChatSession, ResultSnapshot};
use crate::config::DashboardConfig;
use crate::history::HistoryStore;
use crate::notifications::NotificationPoller;
use crate::report::{ReportSink, ReportTrigger};
use crate::search::{SearchOutcome, SearchSession};
use crate::watchlist::WatchlistStore;
use pharmaclear_client::{ClientError, DashboardBackend, Result, SearchParams, SessionCredential};
use pharmaclear_types::{DashboardView, SearchResultSet, WatchlistItem};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;

pub struct Dashboard {
    credential: SessionCredential,
    search: SearchSession,
    history: Arc<HistoryStore>,
    watchlist: WatchlistStore,
    chat: ChatSession,
    notifications: NotificationPoller,
    report: ReportTrigger,
    /// Fire-and-forget side effects (history recording)
    background: Mutex<JoinSet<()>>,
    /// Held for writing while a search moves both search and chat state,
    /// and for reading while a view is composed
    transition: RwLock<()>,
}

impl Dashboard {
    pub fn new(
        backend: Arc<dyn DashboardBackend>,
        credential: SessionCredential,
        config: DashboardConfig,
    ) -> Self {
        let mut params = SearchParams::new();
        if let Some(limit) = config.search_page_size {
            params = params.limit(limit);
        }

        Self {
            search: SearchSession::new(Arc::clone(&backend), credential.clone()).with_params(params),
            history: Arc::new(HistoryStore::new(Arc::clone(&backend), credential.clone())),
            watchlist: WatchlistStore::new(Arc::clone(&backend), credential.clone()),
            chat: ChatSession::new(Arc::clone(&backend), credential.clone())
                .with_fallback_message(config.chat_fallback_message.clone()),
            notifications: NotificationPoller::new(
                Arc::clone(&backend),
                credential.clone(),
                config.poll_interval(),
            ),
            report: ReportTrigger::new(backend, credential.clone()),
            credential,
            background: Mutex::new(JoinSet::new()),
            transition: RwLock::new(()),
        }
    }

    /// Session start: begin polling and load history and watchlist side by side.
    ///
    /// Each load settles its own section; one failing does not hold up the other.
    pub async fn start(&self) {
        tracing::info!("Starting dashboard session");
        self.notifications.start().await;

        let (history, watchlist) = tokio::join!(self.history.load_all(), self.watchlist.load_all());
        if let (Err(_), Err(_)) = (&history, &watchlist) {
            tracing::warn!("History and watchlist both failed to load");
        }
    }

    /// Run a query. `Ok(None)` means blank input or a response overtaken by
    /// a newer search; neither changes what is shown.
    ///
    /// The chat is unbound as soon as the search is issued, so nothing can
    /// be asked about the previous results while the new ones are pending.
    /// Both state transitions happen under the transition lock, so `view()`
    /// never pairs one search's results with another search's conversation.
    pub async fn search(&self, query: &str) -> Result<Option<Arc<SearchResultSet>>> {
        let pending = {
            let _transition = self.transition.write().await;
            let Some(pending) = self.search.begin(query).await else {
                return Ok(None);
            };
            self.chat.reset(ResultSnapshot::empty(pending.epoch)).await;
            pending
        };

        let response = self.search.fetch(&pending).await;

        let outcome = {
            let _transition = self.transition.write().await;
            let outcome = self.search.apply(pending, response).await;
            if let SearchOutcome::Applied { epoch, results } = &outcome {
                self.chat.reset(ResultSnapshot::new(*epoch, results)).await;
            }
            outcome
        };

        if let SearchOutcome::Applied { results, .. } = &outcome {
            self.record_history(results.query.clone()).await;
        }

        outcome.into_result()
    }

    /// Re-run a past query
    pub async fn select_history(&self, id: i64) -> Result<Option<Arc<SearchResultSet>>> {
        let entry = self
            .history
            .get(id)
            .await
            .ok_or_else(|| ClientError::Validation(format!("no history entry with id {}", id)))?;

        self.search(&entry.query_text).await
    }

    pub async fn add_to_watchlist(&self, query: &str) -> Option<WatchlistItem> {
        self.watchlist.add(query).await
    }

    pub async fn remove_from_watchlist(&self, id: i64) -> bool {
        self.watchlist.remove(id).await
    }

    pub async fn send_chat(&self, question: &str) -> ChatOutcome {
        self.chat.send(question).await
    }

    pub async fn toggle_notifications(&self) -> bool {
        self.notifications.toggle_view().await
    }

    pub async fn refresh_notifications(&self) -> bool {
        self.notifications.refresh().await
    }

    /// Render a report for the visible results and hand it to `sink`
    pub async fn generate_report(&self, sink: &dyn ReportSink) -> Result<String> {
        let results = self.search.current().await;
        let document = match self.report.generate(results.as_deref()).await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Report generation failed: {}", e);
                return Err(e);
            }
        };

        sink.save(&document).await.map_err(|e| {
            tracing::warn!("Failed to save report {}: {}", document.file_name, e);
            ClientError::Storage(format!("could not save {}: {}", document.file_name, e))
        })
    }

    pub fn credential(&self) -> &SessionCredential {
        &self.credential
    }

    /// One consistent snapshot of every section
    pub async fn view(&self) -> DashboardView {
        let _transition = self.transition.read().await;
        let (search, history, watchlist, chat, notifications) = tokio::join!(
            self.search.view(),
            self.history.view(),
            self.watchlist.view(),
            self.chat.view(),
            self.notifications.view(),
        );
        let report = self.report.view(search.results.as_deref());

        DashboardView {
            search,
            history,
            watchlist,
            chat,
            notifications,
            report,
        }
    }

    /// Wait for outstanding fire-and-forget side effects
    pub async fn settle(&self) {
        let mut pending = std::mem::take(&mut *self.background.lock().await);
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Background task failed: {}", e);
            }
        }
    }

    /// End the session: stop polling and drain side effects
    pub async fn shutdown(&self) {
        self.notifications.stop().await;
        self.settle().await;
        tracing::info!("Dashboard session ended");
    }

    async fn record_history(&self, query: String) {
        let history = Arc::clone(&self.history);
        let mut background = self.background.lock().await;

        while background.try_join_next().is_some() {}

        background.spawn(async move {
            // Failures are logged by the store; results stay visible either way
            let _ = history.record(&query).await;
        });
    }
}
