//! Authenticated client module
//!
//! Wraps a transport with bearer-token attachment and expiry recovery:
//!
//! - **Outbound**: every request carries `Authorization: Bearer <access token>`
//!   when one is stored
//! - **Inbound**: a first-time 401 triggers one coordinated refresh, after
//!   which the request is replayed with the new token
//! - **Session end**: a missing refresh token or a failed refresh logs the
//!   session out, clears the stored tokens and redirects to the login route
//! - **Session lifecycle**: login, restore, logout and inactivity timeout

mod client;
mod monitor;
mod session;

pub use client::{AuthenticatedClient, AuthenticatedClientBuilder};
pub use monitor::{InactivityMonitor, DEFAULT_CHECK_INTERVAL};
