//! Client configuration
//!
//! Loaded from YAML, overridden by environment variables and CLI flags.
//!
//! ```yaml
//! base_url: https://erp.example.com/api/v1/
//! token_file: /var/lib/session-client/tokens.json
//! headers:
//!   Accept-Language: es
//! inactivity_timeout_minutes: 30
//! waiter_timeout_secs: 20
//! ```

use crate::error::{Error, Result};
use crate::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable overriding `base_url`
pub const ENV_BASE_URL: &str = "SESSION_CLIENT_BASE_URL";

/// Environment variable overriding `token_file`
pub const ENV_TOKEN_FILE: &str = "SESSION_CLIENT_TOKEN_FILE";

/// Configuration for an authenticated client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL all relative paths are resolved against
    pub base_url: String,
    /// Token refresh endpoint, relative to `base_url`
    pub refresh_path: String,
    /// Login (token pair) endpoint, relative to `base_url`
    pub login_path: String,
    /// Current user endpoint, relative to `base_url`
    pub current_user_path: String,
    /// Route the navigator is sent to when the session ends
    pub login_route: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
    /// Headers sent with every request (e.g. `Accept-Language`)
    pub headers: BTreeMap<String, String>,
    /// Token file; tokens are kept in memory when unset
    pub token_file: Option<PathBuf>,
    /// Minutes without activity before the session is ended
    pub inactivity_timeout_minutes: u64,
    /// Give up waiting on an in-flight refresh after this many seconds
    pub waiter_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/v1/".to_string(),
            refresh_path: "token/refresh/".to_string(),
            login_path: "token/".to_string(),
            current_user_path: "users/me/".to_string(),
            login_route: "/login".to_string(),
            timeout_secs: 30,
            user_agent: format!("session-client/{}", env!("CARGO_PKG_VERSION")),
            headers: BTreeMap::new(),
            token_file: None,
            inactivity_timeout_minutes: 15,
            waiter_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        debug!(path = %path.display(), "Loading client config");
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Apply `SESSION_CLIENT_*` environment overrides
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = base_url;
        }
        if let Some(token_file) = lookup(ENV_TOKEN_FILE).filter(|v| !v.is_empty()) {
            self.token_file = Some(PathBuf::from(token_file));
        }
        self
    }

    /// Check field values
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_value("base_url", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::invalid_value("timeout_secs", "must be at least 1"));
        }
        if !self.login_route.starts_with('/') {
            return Err(Error::invalid_value("login_route", "must start with '/'"));
        }
        if self.refresh_path.trim_matches('/') == self.login_path.trim_matches('/') {
            return Err(Error::config(
                "refresh_path and login_path must name different endpoints",
            ));
        }
        if self.waiter_timeout_secs == Some(0) {
            return Err(Error::invalid_value(
                "waiter_timeout_secs",
                "must be at least 1 when set",
            ));
        }
        Ok(())
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Inactivity timeout
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_minutes.saturating_mul(60))
    }

    /// Dead-man timer for refresh waiters
    pub fn waiter_timeout(&self) -> Option<Duration> {
        self.waiter_timeout_secs.map(Duration::from_secs)
    }

    /// Transport configuration derived from this config
    pub fn transport_config(&self) -> TransportConfig {
        self.headers
            .iter()
            .fold(TransportConfig::builder(), |builder, (key, value)| {
                builder.header(key.clone(), value.clone())
            })
            .base_url(self.base_url.clone())
            .timeout(self.timeout())
            .user_agent(self.user_agent.clone())
            .build()
    }

    /// Absolute URL of an endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        self.transport_config().build_url(path)
    }

    /// Absolute URL of the refresh endpoint
    pub fn refresh_url(&self) -> String {
        self.endpoint(&self.refresh_path)
    }
}

/// Builder for client config
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the refresh endpoint path
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.config.refresh_path = path.into();
        self
    }

    /// Set the login endpoint path
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.config.login_path = path.into();
        self
    }

    /// Set the current user endpoint path
    pub fn current_user_path(mut self, path: impl Into<String>) -> Self {
        self.config.current_user_path = path.into();
        self
    }

    /// Set the login route
    pub fn login_route(mut self, route: impl Into<String>) -> Self {
        self.config.login_route = route.into();
        self
    }

    /// Set the request timeout
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Add a header sent with every request
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(key.into(), value.into());
        self
    }

    /// Persist tokens to a file
    pub fn token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.token_file = Some(path.into());
        self
    }

    /// Set the inactivity timeout
    pub fn inactivity_timeout_minutes(mut self, minutes: u64) -> Self {
        self.config.inactivity_timeout_minutes = minutes;
        self
    }

    /// Set the refresh waiter timeout
    pub fn waiter_timeout_secs(mut self, secs: u64) -> Self {
        self.config.waiter_timeout_secs = Some(secs);
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8000/api/v1/");
        assert_eq!(
            config.refresh_url(),
            "http://127.0.0.1:8000/api/v1/token/refresh/"
        );
        assert_eq!(config.login_route, "/login");
        assert_eq!(config.inactivity_timeout(), Duration::from_secs(15 * 60));
        assert!(config.waiter_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = ClientConfig::from_yaml_str(
            r"
base_url: https://erp.example.com/api/v1/
token_file: /tmp/tokens.json
waiter_timeout_secs: 20
headers:
  Accept-Language: es
",
        )
        .unwrap();

        assert_eq!(
            config,
            ClientConfig {
                base_url: "https://erp.example.com/api/v1/".to_string(),
                token_file: Some(PathBuf::from("/tmp/tokens.json")),
                waiter_timeout_secs: Some(20),
                headers: BTreeMap::from([("Accept-Language".to_string(), "es".to_string())]),
                ..ClientConfig::default()
            }
        );
        assert_eq!(config.waiter_timeout(), Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_from_yaml_invalid_url() {
        let err = ClientConfig::from_yaml_str("base_url: not a url").unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ClientConfig::builder().timeout_secs(0).build();
        assert!(config.validate().is_err());

        let config = ClientConfig::builder().base_url("ftp://files.example.com").build();
        assert!(config.validate().is_err());

        let config = ClientConfig::builder().login_route("login").build();
        assert!(config.validate().is_err());

        let config = ClientConfig::builder().waiter_timeout_secs(0).build();
        assert!(config.validate().is_err());

        let config = ClientConfig::builder().login_path("/token/refresh").build();
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_from_missing_file() {
        let err = ClientConfig::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.yaml");
        std::fs::write(&path, "inactivity_timeout_minutes: 30\n").unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.inactivity_timeout_minutes, 30);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_BASE_URL, "https://staging.example.com/api/v1/"),
            (ENV_TOKEN_FILE, ""),
        ]);

        let config = ClientConfig::default()
            .with_overrides_from(|key| vars.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.base_url, "https://staging.example.com/api/v1/");
        // Empty values are ignored
        assert!(config.token_file.is_none());
    }

    #[test]
    fn test_builder_and_endpoints() {
        let config = ClientConfig::builder()
            .base_url("http://localhost:9000/api")
            .refresh_path("/auth/refresh/")
            .login_path("auth/login/")
            .current_user_path("auth/me/")
            .user_agent("test-agent/1.0")
            .build();

        assert_eq!(config.refresh_url(), "http://localhost:9000/api/auth/refresh/");
        assert_eq!(config.endpoint(&config.login_path), "http://localhost:9000/api/auth/login/");
        assert_eq!(config.transport_config().user_agent, "test-agent/1.0");

        let transport = ClientConfig::builder()
            .header("Accept-Language", "en")
            .build()
            .transport_config();
        assert_eq!(
            transport.default_headers.get("Accept-Language").map(String::as_str),
            Some("en")
        );
    }
}
