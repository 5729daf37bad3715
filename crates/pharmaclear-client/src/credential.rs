// Bearer credential shared by every dashboard component.
// Components only read it; the authentication collaborator sets and invalidates it.

use crate::error::{ClientError, Result};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// An issued access token. Debug output never shows the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(Arc<str>);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::from(token.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Handle to the active user's credential
#[derive(Clone)]
pub struct SessionCredential {
    inner: Arc<watch::Sender<Option<BearerToken>>>,
}

impl SessionCredential {
    /// Credential holding an issued token
    pub fn new(token: BearerToken) -> Self {
        let (tx, _) = watch::channel(Some(token));
        Self { inner: Arc::new(tx) }
    }

    /// Credential with no token yet
    pub fn anonymous() -> Self {
        let (tx, _) = watch::channel(None);
        Self { inner: Arc::new(tx) }
    }

    /// Current token, if any
    pub fn token(&self) -> Option<BearerToken> {
        self.inner.borrow().clone()
    }

    pub fn is_present(&self) -> bool {
        self.inner.borrow().is_some()
    }

    /// Token for an authenticated call; a missing token is an auth failure
    pub fn bearer(&self) -> Result<BearerToken> {
        self.token()
            .ok_or_else(|| ClientError::AuthRejected("no active credential".to_string()))
    }

    pub fn replace(&self, token: BearerToken) {
        self.inner.send_replace(Some(token));
    }

    pub fn invalidate(&self) {
        self.inner.send_replace(None);
    }

    /// Observe credential changes (used to end background work on logout)
    pub fn subscribe(&self) -> watch::Receiver<Option<BearerToken>> {
        self.inner.subscribe()
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("present", &self.is_present())
            .finish()
    }
}
