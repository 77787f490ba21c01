//! JWT payload inspection
//!
//! Tokens are decoded without signature verification; the result is only used
//! for display and local expiry hints, never for trust decisions.

use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Claims carried by an access or refresh token
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub jti: Option<String>,
    #[serde(default)]
    pub user_id: Option<Value>,
}

impl TokenClaims {
    /// Decode the payload segment of `token`
    pub fn decode_unverified(token: &str) -> Result<Self> {
        let mut parts = token.split('.');
        let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => return Err(Error::invalid_token("expected three dot-separated segments")),
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| Error::invalid_token(format!("payload is not base64url: {e}")))?;

        let payload: Value = serde_json::from_slice(&bytes)
            .map_err(|e| Error::invalid_token(format!("payload is not JSON: {e}")))?;
        if !payload.is_object() {
            return Err(Error::invalid_token("payload is not a claims object"));
        }

        serde_json::from_value(payload)
            .map_err(|e| Error::invalid_token(format!("payload is not a claims object: {e}")))
    }

    /// Expiry instant, if the token carries one
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Whether the token is expired at `now`; tokens without `exp` never expire
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }

    /// User identifier as text
    pub fn subject(&self) -> Option<String> {
        match self.user_id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
