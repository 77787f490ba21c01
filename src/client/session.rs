//! Session lifecycle: login, restore, logout and inactivity enforcement

use super::client::AuthenticatedClient;
use crate::error::{Error, Result};
use crate::storage::CredentialStoreExt;
use crate::transport::ApiRequest;
use crate::types::{LoginRequest, TokenPairResponse, User, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use chrono::Utc;
use tracing::{debug, info, warn};

impl AuthenticatedClient {
    /// Exchange credentials for a token pair and load the user profile.
    ///
    /// Any failure leaves no tokens behind.
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        match self.try_login(username, password).await {
            Ok(user) => Ok(user),
            Err(error) => {
                if let Err(e) = self.store.clear_credentials() {
                    warn!(error = %e, "Failed to clear tokens after failed login");
                }
                Err(error)
            }
        }
    }

    async fn try_login(&self, username: &str, password: &str) -> Result<User> {
        let body = serde_json::to_value(LoginRequest { username, password })?;
        let request = ApiRequest::post(self.config.login_path.clone(), body);

        // Straight to the transport: a 401 here means bad credentials, not an expired token
        let response = self.transport.send(&request).await.map_err(|e| match e.status() {
            Some(400 | 401) => Error::auth("Invalid username or password"),
            _ => e,
        })?;
        let tokens: TokenPairResponse = response.json()?;

        self.store.set(ACCESS_TOKEN_KEY, &tokens.access)?;
        match &tokens.refresh {
            Some(refresh) => self.store.set(REFRESH_TOKEN_KEY, refresh)?,
            None => self.store.remove(REFRESH_TOKEN_KEY)?,
        }

        let user: User = self.get_json(&self.config.current_user_path).await?;
        self.auth.set_credentials(user.clone(), &tokens.access);
        self.activity.touch()?;

        info!(user = %user.email, "Logged in");
        Ok(user)
    }

    /// Rebuild the in-memory session from stored tokens.
    ///
    /// Returns `None` when there is no stored session or it is no longer
    /// valid; an invalid session's tokens are discarded.
    pub async fn restore_session(&self) -> Result<Option<User>> {
        if self.store.access_token().is_none() {
            debug!("No stored access token");
            return Ok(None);
        }

        match self.get_json::<User>(&self.config.current_user_path).await {
            Ok(user) => {
                // The profile request may have refreshed the token
                let token = self.store.access_token().unwrap_or_default();
                self.auth.set_credentials(user.clone(), &token);
                info!(user = %user.email, "Session restored");
                Ok(Some(user))
            }
            Err(error) => {
                warn!(%error, "Stored session is not valid, discarding tokens");
                self.store.clear_credentials()?;
                Ok(None)
            }
        }
    }

    /// End the session on the user's request
    pub fn logout(&self) -> Result<()> {
        info!("Logging out");
        self.auth.log_out();
        let cleared = self.store.clear_session();
        self.navigator.navigate_to(&self.config.login_route);
        cleared
    }

    /// Log out if the session has been idle longer than the configured timeout
    pub fn enforce_inactivity(&self) -> Result<()> {
        if !self
            .activity
            .is_idle(self.config.inactivity_timeout(), Utc::now())
        {
            return Ok(());
        }

        info!(
            minutes = self.config.inactivity_timeout_minutes,
            "Session expired due to inactivity"
        );
        self.logout()?;
        Err(Error::SessionIdle {
            idle_minutes: self.config.inactivity_timeout_minutes,
        })
    }

    /// Record user activity
    pub fn touch_activity(&self) -> Result<()> {
        self.activity.touch()
    }
}
