//! Storage interface

use crate::error::Result;
use crate::types::{CredentialPair, ACCESS_TOKEN_KEY, LAST_ACTIVITY_KEY, REFRESH_TOKEN_KEY};

/// Durable string key-value store
///
/// Reads never fail; a value that cannot be read is reported as absent.
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Typed access to the credential keys of any [`KeyValueStore`]
pub trait CredentialStoreExt: KeyValueStore {
    /// Current access token
    fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY)
    }

    /// Current refresh token
    fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY)
    }

    /// Both tokens, if both are present
    fn credentials(&self) -> Option<CredentialPair> {
        Some(CredentialPair::new(self.access_token()?, self.refresh_token()?))
    }

    /// Persist a full credential pair
    fn store_credentials(&self, pair: &CredentialPair) -> Result<()> {
        self.set(ACCESS_TOKEN_KEY, &pair.access_token)?;
        self.set(REFRESH_TOKEN_KEY, &pair.refresh_token)
    }

    /// Remove both tokens
    ///
    /// Both removals are attempted; the first failure is returned.
    fn clear_credentials(&self) -> Result<()> {
        let access = self.remove(ACCESS_TOKEN_KEY);
        let refresh = self.remove(REFRESH_TOKEN_KEY);
        access.and(refresh)
    }

    /// Remove both tokens and the activity marker
    fn clear_session(&self) -> Result<()> {
        self.clear_credentials()?;
        self.remove(LAST_ACTIVITY_KEY)
    }
}

impl<T: KeyValueStore + ?Sized> CredentialStoreExt for T {}
