//! Token storage module
//!
//! Durable key-value persistence for the credential pair.
//!
//! # Overview
//!
//! The storage module provides:
//! - `KeyValueStore` - The persistence interface the client depends on
//! - `TokenStore` - In-memory or file-backed implementation
//! - `CredentialStoreExt` - Typed helpers over the fixed token keys

mod store;
mod types;

pub use store::TokenStore;
pub use types::{CredentialStoreExt, KeyValueStore};
