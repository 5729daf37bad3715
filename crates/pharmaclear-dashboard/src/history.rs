use pharmaclear_client::{DashboardBackend, Result, SessionCredential};
use pharmaclear_types::{HistoryEntry, HistoryView, LoadStatus};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct HistoryState {
    entries: Vec<HistoryEntry>,
    status: LoadStatus,
}

/// Past queries of the signed-in user, most recent first
pub struct HistoryStore {
    backend: Arc<dyn DashboardBackend>,
    credential: SessionCredential,
    state: RwLock<HistoryState>,
}

impl HistoryStore {
    pub fn new(backend: Arc<dyn DashboardBackend>, credential: SessionCredential) -> Self {
        Self {
            backend,
            credential,
            state: RwLock::new(HistoryState::default()),
        }
    }

    /// Fetch the full history from the server.
    ///
    /// Entries recorded locally while the load was in flight are kept.
    /// On failure the held entries are left as they are.
    pub async fn load_all(&self) -> Result<usize> {
        self.state.write().await.status = LoadStatus::Loading;

        let loaded = match self.credential.bearer() {
            Ok(token) => self.backend.list_search_history(&token).await,
            Err(e) => Err(e),
        };

        let mut state = self.state.write().await;
        match loaded {
            Ok(loaded) => {
                state.entries = merge_by_id(loaded, &state.entries);
                state.status = LoadStatus::Ready;
                tracing::debug!("Loaded {} history entries", state.entries.len());
                Ok(state.entries.len())
            }
            Err(e) => {
                tracing::warn!("Failed to load search history: {}", e);
                state.status = LoadStatus::Failed(e.user_message());
                Err(e)
            }
        }
    }

    /// Record a query and prepend the server-confirmed entry
    pub async fn record(&self, query: &str) -> Result<HistoryEntry> {
        let recorded = match self.credential.bearer() {
            Ok(token) => self.backend.record_search(&token, query).await,
            Err(e) => Err(e),
        };

        match recorded {
            Ok(entry) => {
                let mut state = self.state.write().await;
                state.entries.retain(|existing| existing.id != entry.id);
                state.entries.insert(0, entry.clone());
                Ok(entry)
            }
            Err(e) => {
                tracing::warn!("Failed to record search {:?}: {}", query, e);
                Err(e)
            }
        }
    }

    pub async fn get(&self, id: i64) -> Option<HistoryEntry> {
        let state = self.state.read().await;
        state.entries.iter().find(|entry| entry.id == id).cloned()
    }

    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.state.read().await.entries.clone()
    }

    pub async fn view(&self) -> HistoryView {
        let state = self.state.read().await;
        HistoryView {
            entries: state.entries.clone(),
            status: state.status.clone(),
        }
    }
}

/// Union of `loaded` and `local` keyed by id, most recent first
fn merge_by_id(loaded: Vec<HistoryEntry>, local: &[HistoryEntry]) -> Vec<HistoryEntry> {
    let mut seen = HashSet::new();
    let mut merged: Vec<HistoryEntry> = loaded
        .into_iter()
        .chain(local.iter().cloned())
        .filter(|entry| seen.insert(entry.id))
        .collect();

    merged.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    merged
}
