//! Token refresh endpoint
//!
//! The refresh call must never pass through the authenticated client, so the
//! HTTP implementation owns its own reqwest client.

use crate::error::{Error, RefreshError, Result};
use crate::transport::TransportConfig;
use crate::types::{RefreshRequest, RefreshResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::{debug, info};

/// Exchanges a refresh token for a new access token
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Perform one refresh; any failure is terminal for the session
    async fn refresh(&self, refresh_token: &str) -> std::result::Result<RefreshResponse, RefreshError>;
}

/// [`TokenRefresher`] calling `POST <url>` with `{"refresh": ...}`
pub struct HttpTokenRefresher {
    /// HTTP client dedicated to refresh requests
    http_client: Client,
    /// Refresh endpoint URL
    url: String,
}

impl HttpTokenRefresher {
    /// Create a refresher with its own HTTP client
    ///
    /// Timeout, user agent and default headers come from `transport`.
    pub fn new(url: impl Into<String>, transport: &TransportConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(transport.timeout)
            .user_agent(&transport.user_agent)
            .default_headers(header_map(transport)?)
            .build()
            .map_err(Error::Http)?;

        Ok(Self::with_client(url, http_client))
    }

    /// Create a refresher with a custom HTTP client
    pub fn with_client(url: impl Into<String>, http_client: Client) -> Self {
        Self {
            http_client,
            url: url.into(),
        }
    }

    /// Refresh endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

fn header_map(transport: &TransportConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(transport.default_headers.len());
    for (key, value) in &transport.default_headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| Error::invalid_value("headers", format!("'{key}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::invalid_value("headers", format!("'{key}': {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> std::result::Result<RefreshResponse, RefreshError> {
        debug!(url = %self.url, "Requesting new access token");

        let response = self
            .http_client
            .post(&self.url)
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await
            .map_err(|e| {
                RefreshError::rejected(
                    e.status().map(|s| s.as_u16()),
                    format!("Refresh request failed: {e}"),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RefreshError::rejected(
                Some(status.as_u16()),
                format!("Refresh token request failed with status {}: {body}", status.as_u16()),
            ));
        }

        let tokens: RefreshResponse = response.json().await.map_err(|e| {
            RefreshError::rejected(
                Some(status.as_u16()),
                format!("Invalid refresh response: {e}"),
            )
        })?;

        info!(rotated = tokens.refresh.is_some(), "Access token refreshed");
        Ok(tokens)
    }
}

impl std::fmt::Debug for HttpTokenRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTokenRefresher")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}
