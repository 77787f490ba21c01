//! Token refresh module
//!
//! Coordinates access-token refresh across concurrent requests.
//!
//! The `RefreshCoordinator` guarantees that at most one refresh is in flight:
//! the first request to see an expired token becomes the leader and performs
//! the refresh, every other request queues as a waiter and is settled in FIFO
//! order with the leader's outcome. The `TokenRefresher` performs the actual
//! exchange over a dedicated HTTP client.

mod coordinator;
mod endpoint;

pub use coordinator::{RefreshCoordinator, RefreshGuard, RefreshWaiter, Ticket};
pub use endpoint::{HttpTokenRefresher, TokenRefresher};

#[cfg(test)]
mod tests;
