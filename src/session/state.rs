//! Authenticated user state

use crate::types::{User, DEFAULT_LANGUAGE};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Process-wide auth state the client updates on login and logout
pub trait AuthStore: Send + Sync {
    /// Record the authenticated user and their access token
    fn set_credentials(&self, user: User, token: &str);

    /// Clear all in-memory authenticated-user state
    fn log_out(&self);
}

/// Snapshot of the authenticated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub language: String,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            token: None,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Shared, thread-safe [`AuthStore`]
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    inner: Arc<RwLock<AuthState>>,
}

impl SessionState {
    /// Create an empty (logged out) session
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> AuthState {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Currently authenticated user
    pub fn current_user(&self) -> Option<User> {
        self.snapshot().user
    }

    /// Access token recorded at login
    pub fn current_token(&self) -> Option<String> {
        self.snapshot().token
    }

    /// Preferred UI language
    pub fn language(&self) -> String {
        self.snapshot().language
    }

    /// Whether a user is logged in
    pub fn is_authenticated(&self) -> bool {
        self.snapshot().user.is_some()
    }

    /// Change the preferred language
    pub fn update_language(&self, language: impl Into<String>) {
        self.update(|state| state.language = language.into());
    }

    fn update(&self, f: impl FnOnce(&mut AuthState)) {
        let mut state = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut state);
    }
}

impl AuthStore for SessionState {
    fn set_credentials(&self, user: User, token: &str) {
        debug!(email = %user.email, "Session credentials set");
        self.update(|state| {
            state.language = user
                .language
                .clone()
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
            state.user = Some(user);
            state.token = Some(token.to_string());
        });
    }

    fn log_out(&self) {
        debug!("Session state cleared");
        self.update(|state| *state = AuthState::default());
    }
}
