// Notification feed: a periodic background fetch plus the bell's
// open/closed state.
//
// The poll task is owned by the poller. `stop()` signals it and waits for it
// to finish, so no fetch is applied after `stop()` returns. The task also
// ends when the credential is invalidated or the poller is dropped.

use pharmaclear_client::{DashboardBackend, SessionCredential};
use pharmaclear_types::{Notification, NotificationView};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Default)]
struct NotificationState {
    items: Vec<Notification>,
    /// Ids known to be read; a fetch can never mark these unread again
    read_ids: HashSet<i64>,
    visible: bool,
}

impl NotificationState {
    fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }

    fn apply_feed(&mut self, feed: Vec<Notification>) {
        self.items = reconcile(feed, &mut self.read_ids);
    }

    fn mark_all_read(&mut self) {
        for notification in &mut self.items {
            notification.mark_read();
            self.read_ids.insert(notification.id);
        }
    }
}

struct PollTask {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

pub struct NotificationPoller {
    backend: Arc<dyn DashboardBackend>,
    credential: SessionCredential,
    period: Duration,
    state: Arc<RwLock<NotificationState>>,
    task: Mutex<Option<PollTask>>,
}

impl NotificationPoller {
    pub fn new(
        backend: Arc<dyn DashboardBackend>,
        credential: SessionCredential,
        period: Duration,
    ) -> Self {
        Self {
            backend,
            credential,
            period,
            state: Arc::new(RwLock::new(NotificationState::default())),
            task: Mutex::new(None),
        }
    }

    /// Fetch now and then every `period` until stopped. Restarts a running poller.
    pub async fn start(&self) {
        let mut task = self.task.lock().await;
        if let Some(previous) = task.take() {
            shut_down(previous).await;
        }

        let (shutdown, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.backend),
            self.credential.clone(),
            self.period,
            Arc::clone(&self.state),
            shutdown_rx,
        ));

        tracing::info!("Notification polling started (every {:?})", self.period);
        *task = Some(PollTask { shutdown, handle });
    }

    /// Stop polling; no fetch from this poller is applied afterwards
    pub async fn stop(&self) {
        if let Some(task) = self.task.lock().await.take() {
            shut_down(task).await;
            tracing::info!("Notification polling stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        match self.task.lock().await.as_ref() {
            Some(task) => !task.handle.is_finished(),
            None => false,
        }
    }

    /// One immediate refresh outside the schedule
    pub async fn refresh(&self) -> bool {
        fetch_once(self.backend.as_ref(), &self.credential, &self.state).await
    }

    /// Flip the bell open or closed and return the new visibility.
    ///
    /// Opening it while something is unread marks everything read locally
    /// right away and asks the server to do the same; the local flip stands
    /// whatever the server answers.
    pub async fn toggle_view(&self) -> bool {
        let (visible, mark_read) = {
            let mut state = self.state.write().await;
            state.visible = !state.visible;
            let mark_read = state.visible && state.unread_count() > 0;
            if mark_read {
                state.mark_all_read();
            }
            (state.visible, mark_read)
        };

        if mark_read {
            let marked = match self.credential.bearer() {
                Ok(token) => self.backend.mark_notifications_read(&token).await,
                Err(e) => Err(e),
            };
            if let Err(e) = marked {
                tracing::warn!("Failed to mark notifications read: {}", e);
            }
        }

        visible
    }

    pub async fn unread_count(&self) -> usize {
        self.state.read().await.unread_count()
    }

    pub async fn view(&self) -> NotificationView {
        let state = self.state.read().await;
        NotificationView {
            items: state.items.clone(),
            unread_count: state.unread_count(),
            visible: state.visible,
        }
    }
}

async fn shut_down(task: PollTask) {
    let _ = task.shutdown.send(());
    if let Err(e) = task.handle.await {
        if !e.is_cancelled() {
            tracing::error!("Notification poll task failed: {}", e);
        }
    }
}

async fn poll_loop(
    backend: Arc<dyn DashboardBackend>,
    credential: SessionCredential,
    period: Duration,
    state: Arc<RwLock<NotificationState>>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut credential_rx = credential.subscribe();

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            changed = credential_rx.changed() => {
                if changed.is_err() || credential_rx.borrow().is_none() {
                    tracing::info!("Credential ended, stopping notification polling");
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        // An in-flight fetch is abandoned, not applied, once shutdown arrives
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = fetch_once(backend.as_ref(), &credential, &state) => {}
        }
    }
}

async fn fetch_once(
    backend: &dyn DashboardBackend,
    credential: &SessionCredential,
    state: &RwLock<NotificationState>,
) -> bool {
    let feed = match credential.bearer() {
        Ok(token) => backend.list_notifications(&token).await,
        Err(e) => Err(e),
    };

    match feed {
        Ok(feed) => {
            let mut state = state.write().await;
            state.apply_feed(feed);
            tracing::debug!(
                "Fetched {} notifications ({} unread)",
                state.items.len(),
                state.unread_count()
            );
            true
        }
        Err(e) => {
            tracing::warn!("Failed to fetch notifications: {}", e);
            false
        }
    }
}

/// Take the server feed, keeping every id already known to be read as read
fn reconcile(feed: Vec<Notification>, read_ids: &mut HashSet<i64>) -> Vec<Notification> {
    feed.into_iter()
        .map(|mut notification| {
            if notification.is_read {
                read_ids.insert(notification.id);
            } else if read_ids.contains(&notification.id) {
                notification.mark_read();
            }
            notification
        })
        .collect()
}
