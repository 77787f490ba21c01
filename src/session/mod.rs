//! Session module
//!
//! In-process session state and the collaborators the client notifies when a
//! session starts or ends.
//!
//! - `AuthStore` / `SessionState` - Authenticated user state with `log_out`
//! - `Navigator` - Redirect capability used to force the login route
//! - `ActivityTracker` - Last-activity bookkeeping for inactivity logout
//! - `TokenClaims` - Unverified JWT payload inspection

mod activity;
mod claims;
mod navigator;
mod state;

pub use activity::ActivityTracker;
pub use claims::TokenClaims;
pub use navigator::{Navigator, RecordingNavigator};
pub use state::{AuthState, AuthStore, SessionState};
