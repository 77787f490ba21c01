//! HTTP transport module
//!
//! The raw request/response layer the authenticated client sits on.
//!
//! # Features
//!
//! - **Request descriptors**: Immutable `ApiRequest` values with a builder API
//! - **Replay markers**: `PendingRequest` carries the single-retry flag
//! - **Status failures**: Non-2xx responses surface as `Error::HttpStatus`
//! - **Pluggable**: Anything implementing `Transport` can back the client

mod client;
mod types;

pub use client::{ReqwestTransport, Transport, TransportConfig, TransportConfigBuilder};
pub use types::{ApiRequest, ApiResponse, PendingRequest};

#[cfg(test)]
mod tests;
