//! Last-activity bookkeeping

use crate::error::Result;
use crate::storage::KeyValueStore;
use crate::types::LAST_ACTIVITY_KEY;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Records user activity in the token store and answers idle checks
#[derive(Clone)]
pub struct ActivityTracker {
    store: Arc<dyn KeyValueStore>,
}

impl ActivityTracker {
    /// Create a tracker over `store`
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Record activity now
    pub fn touch(&self) -> Result<()> {
        self.touch_at(Utc::now())
    }

    /// Record activity at `at`
    pub fn touch_at(&self, at: DateTime<Utc>) -> Result<()> {
        self.store
            .set(LAST_ACTIVITY_KEY, &at.timestamp_millis().to_string())
    }

    /// Last recorded activity; unparsable values count as absent
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.store
            .get(LAST_ACTIVITY_KEY)
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis)
    }

    /// Whether more than `timeout` has passed since the last activity.
    ///
    /// A session with no recorded activity is never idle.
    pub fn is_idle(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        let Some(last) = self.last_activity() else {
            return false;
        };
        let Ok(timeout) = chrono::Duration::from_std(timeout) else {
            return false;
        };
        now - last > timeout
    }

    /// Forget the recorded activity
    pub fn clear(&self) -> Result<()> {
        self.store.remove(LAST_ACTIVITY_KEY)
    }
}

impl std::fmt::Debug for ActivityTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityTracker")
            .field("last_activity", &self.last_activity())
            .finish()
    }
}
