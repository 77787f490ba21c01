//! Authenticated client with coordinated token refresh

use crate::config::ClientConfig;
use crate::error::{Error, RefreshError, Result};
use crate::refresh::{HttpTokenRefresher, RefreshCoordinator, RefreshGuard, Ticket, TokenRefresher};
use crate::session::{ActivityTracker, AuthStore, Navigator, RecordingNavigator, SessionState};
use crate::storage::{CredentialStoreExt, KeyValueStore, TokenStore};
use crate::transport::{ApiRequest, ApiResponse, PendingRequest, ReqwestTransport, Transport};
use crate::types::{RefreshResponse, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// HTTP client that authenticates requests and recovers from expired tokens
///
/// Share it behind an `Arc`; the refresh state lives inside the client so all
/// clones of the `Arc` take part in the same refresh cycles.
pub struct AuthenticatedClient {
    pub(super) config: ClientConfig,
    pub(super) transport: Arc<dyn Transport>,
    pub(super) refresher: Arc<dyn TokenRefresher>,
    pub(super) store: Arc<dyn KeyValueStore>,
    pub(super) auth: Arc<dyn AuthStore>,
    pub(super) navigator: Arc<dyn Navigator>,
    pub(super) activity: ActivityTracker,
    coordinator: RefreshCoordinator,
}

impl AuthenticatedClient {
    /// Create a builder
    pub fn builder(config: ClientConfig) -> AuthenticatedClientBuilder {
        AuthenticatedClientBuilder::new(config)
    }

    /// Create a client with default collaborators
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the token store
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Get the activity tracker
    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    /// Whether a token refresh is in flight
    pub fn is_refreshing(&self) -> bool {
        self.coordinator.is_refreshing()
    }

    /// Number of completed refresh cycles
    pub fn refresh_cycles(&self) -> u64 {
        self.coordinator.completed_cycles()
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::get(path)).await
    }

    /// Make a POST request
    pub async fn post(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.send(ApiRequest::post(path, body)).await
    }

    /// Make a PUT request
    pub async fn put(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.send(ApiRequest::put(path, body)).await
    }

    /// Make a PATCH request
    pub async fn patch(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.send(ApiRequest::patch(path, body)).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Make a GET request and parse JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_json(ApiRequest::get(path)).await
    }

    /// Make a request and parse JSON response
    pub async fn request_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.send(request).await?.json()
    }

    /// Send a request through the auth pipeline
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.send_pending(PendingRequest::new(request)).await
    }

    /// Send a captured request through the auth pipeline.
    ///
    /// A request already marked as retried is never refreshed again; its 401
    /// is returned as is.
    pub async fn send_pending(&self, pending: PendingRequest) -> Result<ApiResponse> {
        match self.dispatch(&pending).await {
            Ok(response) => Ok(response),
            Err(error) => self.recover(pending, error).await,
        }
    }

    /// Attach the bearer token and hand the request to the transport
    async fn dispatch(&self, pending: &PendingRequest) -> Result<ApiResponse> {
        let request = self.authorize(pending);
        self.transport.send(&request).await
    }

    /// Outbound interceptor: replay token first, then the stored access token
    fn authorize(&self, pending: &PendingRequest) -> ApiRequest {
        let token = pending
            .bearer()
            .map(str::to_string)
            .or_else(|| self.store.access_token());

        match token {
            Some(token) => pending.request().with_bearer(&token),
            None => pending.request().clone(),
        }
    }

    /// Inbound interceptor for failed requests
    async fn recover(&self, pending: PendingRequest, error: Error) -> Result<ApiResponse> {
        if !error.is_unauthorized() {
            return Err(error);
        }

        if pending.is_retried() {
            debug!(
                path = pending.request().path(),
                "Still unauthorized after token refresh"
            );
            return Err(error);
        }

        match self.coordinator.begin() {
            Ticket::Waiter(waiter) => {
                let token = waiter.wait_for(self.config.waiter_timeout()).await?;
                self.dispatch(&pending.retry_with(token)).await
            }
            Ticket::Leader(guard) => self.refresh_and_replay(pending, guard).await,
        }
    }

    /// Run one refresh cycle as leader, then replay the original request
    async fn refresh_and_replay(
        &self,
        pending: PendingRequest,
        guard: RefreshGuard<'_>,
    ) -> Result<ApiResponse> {
        let Some(refresh_token) = self.store.refresh_token() else {
            warn!("No refresh token stored, ending session");
            self.end_session();
            guard.reject(RefreshError::NoRefreshToken);
            return Err(RefreshError::NoRefreshToken.into());
        };

        let refreshed = self.refresher.refresh(&refresh_token).await.and_then(|tokens| {
            self.persist_refreshed(&tokens).map_err(|e| {
                RefreshError::rejected(None, format!("Failed to store refreshed token: {e}"))
            })?;
            Ok(tokens)
        });

        match refreshed {
            Ok(tokens) => {
                let woken = guard.resolve(&tokens.access);
                debug!(woken, path = pending.request().path(), "Replaying request");
                self.dispatch(&pending.retry_with(tokens.access)).await
            }
            Err(error) => {
                warn!(%error, "Token refresh failed, ending session");
                guard.reject(error.clone());
                self.end_session();
                Err(error.into())
            }
        }
    }

    fn persist_refreshed(&self, tokens: &RefreshResponse) -> Result<()> {
        self.store.set(ACCESS_TOKEN_KEY, &tokens.access)?;
        if let Some(rotated) = &tokens.refresh {
            self.store.set(REFRESH_TOKEN_KEY, rotated)?;
        }
        Ok(())
    }

    /// Forced logout after an unrecoverable auth failure
    fn end_session(&self) {
        self.auth.log_out();
        if let Err(e) = self.store.clear_credentials() {
            warn!(error = %e, "Failed to clear stored tokens");
        }
        info!(route = %self.config.login_route, "Session ended");
        self.navigator.navigate_to(&self.config.login_route);
    }
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("config", &self.config)
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

/// Builder for [`AuthenticatedClient`]
///
/// Every collaborator defaults to the crate's own implementation.
pub struct AuthenticatedClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    store: Option<Arc<dyn KeyValueStore>>,
    auth: Option<Arc<dyn AuthStore>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl AuthenticatedClientBuilder {
    /// Create a builder for `config`
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            refresher: None,
            store: None,
            auth: None,
            navigator: None,
        }
    }

    /// Use a custom transport
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom token refresher
    pub fn refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Use a custom token store
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a custom auth store
    pub fn auth_store(mut self, auth: Arc<dyn AuthStore>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Use a custom navigator
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<AuthenticatedClient> {
        let config = self.config;
        config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(config.transport_config())?),
        };

        let refresher: Arc<dyn TokenRefresher> = match self.refresher {
            Some(refresher) => refresher,
            None => Arc::new(HttpTokenRefresher::new(
                config.refresh_url(),
                &config.transport_config(),
            )?),
        };

        let store: Arc<dyn KeyValueStore> = match self.store {
            Some(store) => store,
            None => match &config.token_file {
                Some(path) => Arc::new(TokenStore::from_file(path)?),
                None => Arc::new(TokenStore::in_memory()),
            },
        };

        let auth: Arc<dyn AuthStore> = match self.auth {
            Some(auth) => auth,
            None => Arc::new(SessionState::new()),
        };
        let navigator: Arc<dyn Navigator> = match self.navigator {
            Some(navigator) => navigator,
            None => Arc::new(RecordingNavigator::new()),
        };
        let activity = ActivityTracker::new(Arc::clone(&store));

        Ok(AuthenticatedClient {
            config,
            transport,
            refresher,
            store,
            auth,
            navigator,
            activity,
            coordinator: RefreshCoordinator::new(),
        })
    }
}
