//! Error types for the session client
//!
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Refresh failures are modelled separately by [`RefreshError`] because the
//! same failure has to be handed to every request waiting on a refresh.

use thiserror::Error;

/// Failure of a token refresh cycle.
///
/// Cloned once per queued waiter when a refresh settles.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("No refresh token")]
    NoRefreshToken,

    #[error("Token refresh rejected{}: {message}", status_suffix(.status))]
    Rejected {
        status: Option<u16>,
        message: String,
    },

    #[error("Token refresh was abandoned before it settled")]
    Abandoned,

    #[error("Timed out after {timeout_ms}ms waiting for token refresh")]
    WaitTimedOut { timeout_ms: u64 },
}

impl RefreshError {
    /// Create a rejection error
    pub fn rejected(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// The main error type for the session client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error(transparent)]
    Refresh(#[from] RefreshError),

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error("Session expired after {idle_minutes} minutes of inactivity")]
    SessionIdle { idle_minutes: u64 },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Token storage error: {message}")]
    Storage { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an invalid token error
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this is an expiry-driven failure (HTTP 401)
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Whether this error ended the session (forced logout already happened)
    pub fn is_session_ended(&self) -> bool {
        matches!(
            self,
            Error::Refresh(RefreshError::NoRefreshToken | RefreshError::Rejected { .. })
                | Error::SessionIdle { .. }
        )
    }
}

/// Result type alias for the session client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");

        let err: Error = RefreshError::NoRefreshToken.into();
        assert_eq!(err.to_string(), "No refresh token");
    }

    #[test]
    fn test_refresh_error_display() {
        let err = RefreshError::rejected(Some(401), "token_not_valid");
        assert_eq!(
            err.to_string(),
            "Token refresh rejected (HTTP 401): token_not_valid"
        );

        let err = RefreshError::rejected(None, "connection refused");
        assert_eq!(err.to_string(), "Token refresh rejected: connection refused");
    }

    #[test_case(Error::http_status(401, ""), Some(401) ; "unauthorized")]
    #[test_case(Error::http_status(500, "boom"), Some(500) ; "server error")]
    #[test_case(Error::Timeout { timeout_ms: 10 }, None ; "timeout has no status")]
    #[test_case(Error::config("x"), None ; "config has no status")]
    fn test_status(err: Error, expected: Option<u16>) {
        assert_eq!(err.status(), expected);
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(Error::http_status(401, "").is_unauthorized());
        assert!(!Error::http_status(403, "").is_unauthorized());
        assert!(!Error::from(RefreshError::NoRefreshToken).is_unauthorized());
    }

    #[test]
    fn test_is_session_ended() {
        assert!(Error::from(RefreshError::NoRefreshToken).is_session_ended());
        assert!(Error::from(RefreshError::rejected(Some(400), "bad")).is_session_ended());
        assert!(Error::SessionIdle { idle_minutes: 15 }.is_session_ended());
        assert!(!Error::from(RefreshError::Abandoned).is_session_ended());
        assert!(!Error::http_status(401, "").is_session_ended());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
