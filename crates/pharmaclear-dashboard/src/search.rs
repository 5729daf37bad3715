// Query execution with last-issued-wins ordering.
//
// Every call takes a fresh epoch before it goes to the network and clears
// the visible result set. A response is applied only if its epoch is still
// the current one when it resolves; otherwise it is dropped, so a slow
// earlier search can never overwrite a later one.

use pharmaclear_client::{ClientError, DashboardBackend, SearchParams, SessionCredential};
use pharmaclear_types::{SearchResultSet, SearchView};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// The response was current and is now the visible result set
    Applied {
        epoch: u64,
        results: Arc<SearchResultSet>,
    },
    /// The search failed while current; the visible result set was cleared
    Failed { epoch: u64, error: ClientError },
    /// A newer search was issued before this one resolved
    Superseded { epoch: u64 },
    /// Blank input, nothing was sent
    Ignored,
}

impl SearchOutcome {
    /// Collapse into the caller-facing contract: results, an error, or nothing
    pub fn into_result(self) -> Result<Option<Arc<SearchResultSet>>, ClientError> {
        match self {
            SearchOutcome::Applied { results, .. } => Ok(Some(results)),
            SearchOutcome::Failed { error, .. } => Err(error),
            SearchOutcome::Superseded { .. } | SearchOutcome::Ignored => Ok(None),
        }
    }
}

/// A search that has taken its epoch but not yet been sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSearch {
    pub epoch: u64,
    query: String,
}

impl PendingSearch {
    pub fn query(&self) -> &str {
        &self.query
    }
}

#[derive(Default)]
struct SearchState {
    epoch: u64,
    query: Option<String>,
    results: Option<Arc<SearchResultSet>>,
    pending: bool,
    error: Option<String>,
}

pub struct SearchSession {
    backend: Arc<dyn DashboardBackend>,
    credential: SessionCredential,
    params: SearchParams,
    state: RwLock<SearchState>,
}

impl SearchSession {
    pub fn new(backend: Arc<dyn DashboardBackend>, credential: SessionCredential) -> Self {
        Self {
            backend,
            credential,
            params: SearchParams::default(),
            state: RwLock::new(SearchState::default()),
        }
    }

    pub fn with_params(mut self, params: SearchParams) -> Self {
        self.params = params;
        self
    }

    pub async fn search(&self, query: &str) -> SearchOutcome {
        match self.begin(query).await {
            Some(pending) => self.resolve(pending).await,
            None => SearchOutcome::Ignored,
        }
    }

    /// Take the next epoch for `query` and clear the visible result set.
    ///
    /// Returns `None` for blank input, which leaves the state untouched.
    pub async fn begin(&self, query: &str) -> Option<PendingSearch> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let mut state = self.state.write().await;
        state.epoch += 1;
        state.query = Some(query.to_string());
        state.results = None;
        state.pending = true;
        state.error = None;

        Some(PendingSearch {
            epoch: state.epoch,
            query: query.to_string(),
        })
    }

    /// Send a search taken with `begin` and apply the response if it is still current
    pub async fn resolve(&self, pending: PendingSearch) -> SearchOutcome {
        let response = self.fetch(&pending).await;
        self.apply(pending, response).await
    }

    /// The network half of `resolve`; touches no state
    pub async fn fetch(&self, pending: &PendingSearch) -> Result<SearchResultSet, ClientError> {
        tracing::debug!(
            "Dispatching search epoch={} query={:?}",
            pending.epoch,
            pending.query
        );

        let token = self.credential.bearer()?;
        self.backend
            .search_alerts(&token, &pending.query, self.params)
            .await
    }

    /// The state half of `resolve`: apply `response` unless a newer search was issued
    pub async fn apply(
        &self,
        pending: PendingSearch,
        response: Result<SearchResultSet, ClientError>,
    ) -> SearchOutcome {
        let PendingSearch { epoch, query } = pending;

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            tracing::debug!(
                "Discarding search response epoch={} (current epoch={})",
                epoch,
                state.epoch
            );
            return SearchOutcome::Superseded { epoch };
        }

        state.pending = false;
        match response {
            Ok(results) => {
                let results = Arc::new(results);
                tracing::info!(
                    "Search {:?} returned {} alerts (total {})",
                    query,
                    results.len(),
                    results.total
                );
                state.results = Some(Arc::clone(&results));
                SearchOutcome::Applied { epoch, results }
            }
            Err(error) => {
                tracing::warn!("Search {:?} failed: {}", query, error);
                state.error = Some(error.user_message());
                SearchOutcome::Failed { epoch, error }
            }
        }
    }

    /// The result set currently shown, if any
    pub async fn current(&self) -> Option<Arc<SearchResultSet>> {
        self.state.read().await.results.clone()
    }

    pub async fn current_epoch(&self) -> u64 {
        self.state.read().await.epoch
    }

    pub async fn view(&self) -> SearchView {
        let state = self.state.read().await;
        SearchView {
            query: state.query.clone(),
            results: state.results.clone(),
            pending: state.pending,
            error: state.error.clone(),
        }
    }
}
