// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # session-client
//!
//! An HTTP client for token-authenticated APIs that keeps a session alive
//! across access-token expiry.
//!
//! ## Features
//!
//! - **Bearer attachment**: Every request carries the stored access token
//! - **Coordinated refresh**: Concurrent 401s share a single refresh call
//! - **Replay**: Requests that hit an expired token are replayed once with the new token
//! - **Forced logout**: An unrecoverable refresh failure clears the tokens and
//!   redirects to the login route
//! - **Session lifecycle**: Login, restore, logout and inactivity timeout
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use session_client::{AuthenticatedClient, ClientConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::from_file("client.yaml")?.with_env_overrides();
//!     let client = AuthenticatedClient::new(config)?;
//!
//!     client.login("ana", "secret").await?;
//!
//!     // Expired tokens are refreshed transparently
//!     let orders: serde_json::Value = client.get_json("orders/").await?;
//!     println!("{orders}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      AuthenticatedClient                        │
//! │  send() → authorize → Transport → 401? → RefreshCoordinator     │
//! │                                     │                           │
//! │                         leader: TokenRefresher → replay         │
//! │                         waiter: oneshot (FIFO)  → replay        │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───┬───────────────┬─────────────┐
//! │  Transport   │     Refresh       │    Storage    │   Session   │
//! ├──────────────┼───────────────────┼───────────────┼─────────────┤
//! │ reqwest      │ Coordinator       │ In-memory     │ AuthStore   │
//! │ ApiRequest   │ HTTP refresher    │ JSON file     │ Navigator   │
//! │ Pending/Retry│ Waiter queue      │ Atomic writes │ Activity    │
//! └──────────────┴───────────────────┴───────────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the session client
pub mod error;

/// Common types and storage keys
pub mod types;

/// Client configuration
pub mod config;

/// Durable token storage
pub mod storage;

/// Auth state, navigation and activity tracking
pub mod session;

/// HTTP transport
pub mod transport;

/// Single-flight token refresh
pub mod refresh;

/// Authenticated client
pub mod client;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, RefreshError, Result};
pub use types::*;

// Re-export commonly used types
pub use client::{AuthenticatedClient, AuthenticatedClientBuilder, InactivityMonitor};
pub use config::ClientConfig;
pub use session::{AuthStore, Navigator, RecordingNavigator, SessionState};
pub use storage::{CredentialStoreExt, KeyValueStore, TokenStore};
pub use transport::{ApiRequest, ApiResponse, PendingRequest, Transport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
