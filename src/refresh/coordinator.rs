//! Single-flight refresh coordination

use crate::error::RefreshError;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

type Outcome = std::result::Result<String, RefreshError>;

#[derive(Debug, Default)]
struct RefreshState {
    is_refreshing: bool,
    waiters: VecDeque<oneshot::Sender<Outcome>>,
    completed_cycles: u64,
}

/// Owner of the refresh flag and the waiter queue
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

/// Role assigned to a request that hit an expired token
#[derive(Debug)]
pub enum Ticket<'a> {
    /// No refresh was running; the holder must perform it
    Leader(RefreshGuard<'a>),
    /// A refresh is running; wait for its outcome
    Waiter(RefreshWaiter),
}

impl RefreshCoordinator {
    /// Create an idle coordinator
    pub fn new() -> Self {
        Self::default()
    }

    /// Become the refresh leader, or queue behind the running refresh.
    ///
    /// Checking and setting the flag happen under one lock, so exactly one
    /// caller per cycle receives [`Ticket::Leader`].
    pub fn begin(&self) -> Ticket<'_> {
        let mut state = self.lock();
        if state.is_refreshing {
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            debug!(position = state.waiters.len(), "Queued behind in-flight token refresh");
            Ticket::Waiter(RefreshWaiter { rx })
        } else {
            state.is_refreshing = true;
            debug!("Starting token refresh");
            Ticket::Leader(RefreshGuard {
                coordinator: self,
                settled: false,
            })
        }
    }

    /// Whether a refresh is currently in flight
    pub fn is_refreshing(&self) -> bool {
        self.lock().is_refreshing
    }

    /// Number of requests waiting on the in-flight refresh
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Number of refresh cycles that have settled
    pub fn completed_cycles(&self) -> u64 {
        self.lock().completed_cycles
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// End the cycle and settle all waiters in enqueue order.
    ///
    /// The flag reset and queue drain share one critical section so a late
    /// request either joins this cycle's queue or starts a new cycle.
    fn settle(&self, outcome: &Outcome) -> usize {
        let waiters = {
            let mut state = self.lock();
            state.is_refreshing = false;
            state.completed_cycles += 1;
            std::mem::take(&mut state.waiters)
        };

        let count = waiters.len();
        for waiter in waiters {
            // A waiter that gave up (timed out) has dropped its receiver
            let _ = waiter.send(outcome.clone());
        }
        count
    }
}

/// Held by the refresh leader for the duration of one refresh.
///
/// Dropping the guard without settling (early return, panic, cancelled
/// future) ends the cycle and rejects every waiter with
/// [`RefreshError::Abandoned`].
#[derive(Debug)]
pub struct RefreshGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshGuard<'_> {
    /// Hand the new access token to every waiter; returns how many were woken
    pub fn resolve(mut self, token: &str) -> usize {
        self.settled = true;
        let woken = self.coordinator.settle(&Ok(token.to_string()));
        debug!(woken, "Token refresh succeeded");
        woken
    }

    /// Fail every waiter with `error`; returns how many were woken
    pub fn reject(mut self, error: RefreshError) -> usize {
        self.settled = true;
        let woken = self.coordinator.settle(&Err(error));
        debug!(woken, "Token refresh failed");
        woken
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator.settle(&Err(RefreshError::Abandoned));
        }
    }
}

/// A request suspended until the in-flight refresh settles
#[derive(Debug)]
pub struct RefreshWaiter {
    rx: oneshot::Receiver<Outcome>,
}

impl RefreshWaiter {
    /// Wait for the new access token or the refresh error
    pub async fn wait(self) -> Outcome {
        self.rx.await.unwrap_or(Err(RefreshError::Abandoned))
    }

    /// Like [`wait`](Self::wait), giving up after `timeout` if one is set.
    ///
    /// Giving up only affects this waiter. Its sender stays queued until the
    /// cycle settles, and `settle` skips it because the receiver is closed.
    pub async fn wait_for(self, timeout: Option<Duration>) -> Outcome {
        let Some(timeout) = timeout else {
            return self.wait().await;
        };

        #[allow(clippy::cast_possible_truncation)]
        let timeout_ms = timeout.as_millis() as u64;
        tokio::time::timeout(timeout, self.wait())
            .await
            .unwrap_or(Err(RefreshError::WaitTimedOut { timeout_ms }))
    }
}
