// Saved queries. Membership changes are applied only after the server
// acknowledges them; a failed mutation leaves local state untouched.

use pharmaclear_client::{DashboardBackend, Result, SessionCredential};
use pharmaclear_types::{normalize_query, LoadStatus, WatchlistItem, WatchlistView};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct WatchlistState {
    items: Vec<WatchlistItem>,
    /// Normalised text of adds awaiting acknowledgment
    pending_adds: HashSet<String>,
    /// Ids of removals awaiting acknowledgment
    pending_removes: HashSet<i64>,
    status: LoadStatus,
}

impl WatchlistState {
    fn contains_key(&self, key: &str) -> bool {
        self.items.iter().any(|item| item.key() == key)
    }

    fn contains_id(&self, id: i64) -> bool {
        self.items.iter().any(|item| item.id == id)
    }
}

pub struct WatchlistStore {
    backend: Arc<dyn DashboardBackend>,
    credential: SessionCredential,
    state: RwLock<WatchlistState>,
}

impl WatchlistStore {
    pub fn new(backend: Arc<dyn DashboardBackend>, credential: SessionCredential) -> Self {
        Self {
            backend,
            credential,
            state: RwLock::new(WatchlistState::default()),
        }
    }

    pub async fn load_all(&self) -> Result<usize> {
        self.state.write().await.status = LoadStatus::Loading;

        let loaded = match self.credential.bearer() {
            Ok(token) => self.backend.list_watchlist(&token).await,
            Err(e) => Err(e),
        };

        let mut state = self.state.write().await;
        match loaded {
            Ok(loaded) => {
                state.items = merge_items(loaded, &state.items);
                state.status = LoadStatus::Ready;
                tracing::debug!("Loaded {} watchlist items", state.items.len());
                Ok(state.items.len())
            }
            Err(e) => {
                tracing::warn!("Failed to load watchlist: {}", e);
                state.status = LoadStatus::Failed(e.user_message());
                Err(e)
            }
        }
    }

    /// Save a query. Returns `None` without touching the network for blank
    /// or duplicate text, and `None` after logging when the server refuses.
    pub async fn add(&self, query: &str) -> Option<WatchlistItem> {
        let query = query.trim();
        if query.is_empty() {
            tracing::debug!("Ignoring empty watchlist query");
            return None;
        }

        let key = normalize_query(query);
        {
            let mut state = self.state.write().await;
            if state.contains_key(&key) || state.pending_adds.contains(&key) {
                tracing::debug!("{:?} is already on the watchlist", query);
                return None;
            }
            state.pending_adds.insert(key.clone());
        }

        let added = match self.credential.bearer() {
            Ok(token) => self.backend.add_watchlist(&token, query).await,
            Err(e) => Err(e),
        };

        let mut state = self.state.write().await;
        state.pending_adds.remove(&key);

        match added {
            Ok(item) => {
                // A concurrent load may already have brought the item in
                if !state.contains_id(item.id) && !state.contains_key(&item.key()) {
                    state.items.push(item.clone());
                }
                tracing::info!("Added {:?} to watchlist (id {})", item.query_text, item.id);
                Some(item)
            }
            Err(e) => {
                tracing::warn!("Failed to add {:?} to watchlist: {}", query, e);
                None
            }
        }
    }

    /// Remove an item by id. Returns `false` if it is not held locally,
    /// is already being removed, or the server refuses.
    pub async fn remove(&self, id: i64) -> bool {
        {
            let mut state = self.state.write().await;
            if !state.contains_id(id) || !state.pending_removes.insert(id) {
                return false;
            }
        }

        let removed = match self.credential.bearer() {
            Ok(token) => self.backend.remove_watchlist(&token, id).await,
            Err(e) => Err(e),
        };

        let mut state = self.state.write().await;
        state.pending_removes.remove(&id);

        match removed {
            Ok(()) => {
                state.items.retain(|item| item.id != id);
                tracing::info!("Removed watchlist item {}", id);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to remove watchlist item {}: {}", id, e);
                false
            }
        }
    }

    pub async fn items(&self) -> Vec<WatchlistItem> {
        self.state.read().await.items.clone()
    }

    pub async fn view(&self) -> WatchlistView {
        let state = self.state.read().await;
        WatchlistView {
            items: state.items.clone(),
            status: state.status.clone(),
        }
    }
}

/// Server order first, then local-only items; unique by id and by text
fn merge_items(loaded: Vec<WatchlistItem>, local: &[WatchlistItem]) -> Vec<WatchlistItem> {
    let mut ids = HashSet::new();
    let mut keys = HashSet::new();

    loaded
        .into_iter()
        .chain(local.iter().cloned())
        .filter(|item| ids.insert(item.id) && keys.insert(item.key()))
        .collect()
}
