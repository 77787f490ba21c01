//! Background inactivity enforcement

use super::client::AuthenticatedClient;
use crate::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::warn;

/// Default interval between idle checks
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically logs the session out once it has been idle too long.
///
/// The task stops when the monitor is dropped.
#[derive(Debug)]
pub struct InactivityMonitor {
    handle: JoinHandle<()>,
}

impl InactivityMonitor {
    /// Spawn a monitor checking once a minute
    pub fn spawn(client: Arc<AuthenticatedClient>) -> Self {
        Self::spawn_with_interval(client, DEFAULT_CHECK_INTERVAL)
    }

    /// Spawn a monitor checking every `every`
    pub fn spawn_with_interval(client: Arc<AuthenticatedClient>, every: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match client.enforce_inactivity() {
                    Ok(()) | Err(Error::SessionIdle { .. }) => {}
                    Err(e) => warn!(error = %e, "Inactivity check failed"),
                }
            }
        });

        Self { handle }
    }

    /// Whether the monitor task is still running
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop monitoring
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for InactivityMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
