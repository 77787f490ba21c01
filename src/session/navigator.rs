//! Navigation capability

use std::sync::{Arc, Mutex};
use tracing::info;

/// Redirect target for forced navigation (e.g. to the login route)
pub trait Navigator: Send + Sync {
    /// Navigate to `path`
    fn navigate_to(&self, path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate_to(&self, path: &str) {
        self(path);
    }
}

/// Navigator that records every redirect it is asked to perform
///
/// Used by the CLI to report that a session ended, and by tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    history: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    /// Create a navigator with empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// All redirects, oldest first
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Most recent redirect
    pub fn last(&self) -> Option<String> {
        self.history().pop()
    }

    /// Whether a redirect to `path` happened
    pub fn redirected_to(&self, path: &str) -> bool {
        self.history().iter().any(|p| p == path)
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, path: &str) {
        info!(path, "Redirecting");
        self.history
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(path.to_string());
    }
}
