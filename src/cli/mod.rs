//! CLI module
//!
//! Command-line interface for an authenticated API session.
//!
//! # Commands
//!
//! - `login` - Exchange credentials for a token pair
//! - `logout` - End the session
//! - `whoami` - Show the session's user
//! - `status` - Inspect stored tokens without touching the network
//! - `request` - Send an authenticated request

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
