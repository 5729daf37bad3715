// Assistant conversation bound to one result snapshot.
//
// At most one request is outstanding at any time; the session enforces this
// itself rather than relying on the caller disabling input.

use crate::config::DEFAULT_CHAT_FALLBACK;
use pharmaclear_client::{DashboardBackend, SessionCredential};
use pharmaclear_types::{AlertContext, ChatMessage, ChatView, SearchResultSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Frozen projection of the alerts a conversation is about
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSnapshot {
    /// Search epoch the snapshot was taken from
    pub epoch: u64,
    pub alerts: Arc<[AlertContext]>,
}

impl ResultSnapshot {
    pub fn new(epoch: u64, results: &SearchResultSet) -> Self {
        Self {
            epoch,
            alerts: results.contexts().into(),
        }
    }

    /// Snapshot of a cleared result set
    pub fn empty(epoch: u64) -> Self {
        Self {
            epoch,
            alerts: Arc::from(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

impl Default for ResultSnapshot {
    fn default() -> Self {
        Self::empty(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRejection {
    EmptyQuestion,
    /// No alerts to talk about
    NoContext,
    /// A previous question is still awaiting its answer
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    Replied(ChatMessage),
    /// The request failed; the fallback turn was appended instead
    Fallback(ChatMessage),
    /// The conversation was reset while the request was outstanding
    Discarded,
    Rejected(ChatRejection),
}

#[derive(Default)]
struct ChatState {
    snapshot: ResultSnapshot,
    /// Bumped on every reset; replies for an older conversation are dropped
    conversation: u64,
    messages: Vec<ChatMessage>,
    next_id: u64,
    in_flight: bool,
}

impl ChatState {
    fn push_user(&mut self, text: &str) -> ChatMessage {
        self.next_id += 1;
        let message = ChatMessage::user(self.next_id, text);
        self.messages.push(message.clone());
        message
    }

    fn push_assistant(&mut self, text: &str) -> ChatMessage {
        self.next_id += 1;
        let message = ChatMessage::assistant(self.next_id, text);
        self.messages.push(message.clone());
        message
    }
}

pub struct ChatSession {
    backend: Arc<dyn DashboardBackend>,
    credential: SessionCredential,
    fallback_message: String,
    state: RwLock<ChatState>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn DashboardBackend>, credential: SessionCredential) -> Self {
        Self {
            backend,
            credential,
            fallback_message: DEFAULT_CHAT_FALLBACK.to_string(),
            state: RwLock::new(ChatState::default()),
        }
    }

    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    /// Start a new conversation about `snapshot`.
    ///
    /// Snapshots older than the one already bound are ignored, so resets
    /// arriving out of order cannot rebind a stale result set.
    pub async fn reset(&self, snapshot: ResultSnapshot) -> bool {
        let mut state = self.state.write().await;
        if snapshot.epoch < state.snapshot.epoch {
            tracing::debug!(
                "Ignoring chat reset for epoch {} (bound to {})",
                snapshot.epoch,
                state.snapshot.epoch
            );
            return false;
        }

        state.messages.clear();
        state.conversation += 1;
        state.snapshot = snapshot;
        true
    }

    pub async fn send(&self, question: &str) -> ChatOutcome {
        let question = question.trim();

        let (conversation, alerts) = {
            let mut state = self.state.write().await;
            if question.is_empty() {
                return ChatOutcome::Rejected(ChatRejection::EmptyQuestion);
            }
            if state.snapshot.is_empty() {
                return ChatOutcome::Rejected(ChatRejection::NoContext);
            }
            if state.in_flight {
                return ChatOutcome::Rejected(ChatRejection::Busy);
            }

            state.in_flight = true;
            state.push_user(question);
            (state.conversation, Arc::clone(&state.snapshot.alerts))
        };

        let answer = match self.credential.bearer() {
            Ok(token) => self.backend.send_chat(&token, question, &alerts).await,
            Err(e) => Err(e),
        };

        let mut state = self.state.write().await;
        state.in_flight = false;

        if state.conversation != conversation {
            tracing::debug!("Dropping chat answer for a conversation that was reset");
            return ChatOutcome::Discarded;
        }

        match answer {
            Ok(text) => ChatOutcome::Replied(state.push_assistant(&text)),
            Err(e) => {
                tracing::warn!("Chat request failed: {}", e);
                let fallback = self.fallback_message.clone();
                ChatOutcome::Fallback(state.push_assistant(&fallback))
            }
        }
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.read().await.messages.clone()
    }

    pub async fn is_in_flight(&self) -> bool {
        self.state.read().await.in_flight
    }

    pub async fn view(&self) -> ChatView {
        let state = self.state.read().await;
        ChatView {
            messages: state.messages.clone(),
            in_flight: state.in_flight,
            enabled: !state.in_flight && !state.snapshot.is_empty(),
        }
    }
}
