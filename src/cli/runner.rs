//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::client::AuthenticatedClient;
use crate::config::ClientConfig;
use crate::error::{Error, Result, ResultExt};
use crate::session::{RecordingNavigator, SessionState, TokenClaims};
use crate::storage::CredentialStoreExt;
use crate::transport::{ApiRequest, ApiResponse};
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Token file used when neither config, environment nor flags name one
const DEFAULT_TOKEN_FILE: &str = ".session-client/tokens.json";

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        let session = SessionState::new();
        let navigator = RecordingNavigator::new();

        let client = AuthenticatedClient::builder(config)
            .auth_store(Arc::new(session.clone()))
            .navigator(Arc::new(navigator.clone()))
            .build()?;

        let requires_session = self.cli.command.requires_session();
        let result = if requires_session {
            match client.enforce_inactivity() {
                Ok(()) => self.execute(&client, &session).await,
                Err(e) => Err(e),
            }
        } else {
            self.execute(&client, &session).await
        };

        if requires_session && result.is_ok() {
            client.touch_activity()?;
        }

        let login_route = &client.config().login_route;
        if !matches!(self.cli.command, Commands::Logout) && navigator.redirected_to(login_route) {
            self.output_message(&json!({
                "type": "SESSION",
                "session": {
                    "status": "ENDED",
                    "redirect": login_route,
                    "reason": result.as_ref().err().map(ToString::to_string),
                }
            }));
        }

        result
    }

    /// Dispatch the subcommand
    async fn execute(&self, client: &AuthenticatedClient, session: &SessionState) -> Result<()> {
        match &self.cli.command {
            Commands::Login { username, password } => self.login(client, username, password).await,
            Commands::Logout => self.logout(client),
            Commands::Whoami => self.whoami(client, session).await,
            Commands::Status => self.status(client),
            Commands::Request {
                method,
                path,
                json,
                query,
            } => self.request(client, method, path, json.as_deref(), query).await,
        }
    }

    /// Load configuration: file, then environment, then flags
    fn load_config(&self) -> Result<ClientConfig> {
        let config = match &self.cli.config {
            Some(path) => ClientConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ClientConfig::default(),
        };
        self.resolve_config(config.with_env_overrides())
    }

    /// Apply command-line overrides and validate
    pub(crate) fn resolve_config(&self, mut config: ClientConfig) -> Result<ClientConfig> {
        if let Some(base_url) = &self.cli.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(token_file) = &self.cli.token_file {
            config.token_file = Some(token_file.clone());
        }
        if config.token_file.is_none() {
            config.token_file = default_token_file();
        }

        config.validate()?;
        debug!(base_url = %config.base_url, token_file = ?config.token_file, "Resolved config");
        Ok(config)
    }

    /// Log in
    async fn login(&self, client: &AuthenticatedClient, username: &str, password: &str) -> Result<()> {
        let user = client.login(username, password).await?;
        self.output_message(&json!({
            "type": "SESSION",
            "session": {
                "status": "LOGGED_IN",
                "user": user,
                "display_name": user.display_name(),
            }
        }));
        Ok(())
    }

    /// Log out
    fn logout(&self, client: &AuthenticatedClient) -> Result<()> {
        client.logout()?;
        self.output_message(&json!({
            "type": "SESSION",
            "session": {
                "status": "LOGGED_OUT",
                "redirect": client.config().login_route,
            }
        }));
        Ok(())
    }

    /// Show the current user
    async fn whoami(&self, client: &AuthenticatedClient, session: &SessionState) -> Result<()> {
        let user = client
            .restore_session()
            .await?
            .ok_or_else(|| Error::auth("Not logged in"))?;

        self.output_message(&json!({
            "type": "USER",
            "user": user,
            "display_name": user.display_name(),
            "language": session.language(),
        }));
        Ok(())
    }

    /// Report stored session status without any network call
    fn status(&self, client: &AuthenticatedClient) -> Result<()> {
        let store = client.store();
        let access = store.access_token();
        let claims = access
            .as_deref()
            .and_then(|token| TokenClaims::decode_unverified(token).ok());
        let now = Utc::now();
        let config = client.config();

        self.output_message(&json!({
            "type": "STATUS",
            "status": {
                "has_access_token": access.is_some(),
                "has_refresh_token": store.refresh_token().is_some(),
                "user_id": claims.as_ref().and_then(TokenClaims::subject),
                "access_expires_at": claims.as_ref().and_then(TokenClaims::expires_at),
                "access_expired": claims.as_ref().map(|c| c.is_expired_at(now)),
                "last_activity": client.activity().last_activity(),
                "idle": client.activity().is_idle(config.inactivity_timeout(), now),
                "inactivity_timeout_minutes": config.inactivity_timeout_minutes,
            }
        }));
        Ok(())
    }

    /// Send an arbitrary authenticated request
    async fn request(
        &self,
        client: &AuthenticatedClient,
        method: &str,
        path: &str,
        body: Option<&str>,
        query: &[String],
    ) -> Result<()> {
        let mut request = ApiRequest::new(parse_method(method)?, path);
        for pair in query {
            let (key, value) = parse_query_pair(pair)?;
            request = request.query(key, value);
        }
        if let Some(body) = body {
            let body: Value = serde_json::from_str(body)
                .map_err(|e| Error::invalid_request(format!("Invalid JSON body: {e}")))?;
            request = request.json(body);
        }

        let response = client.send(request).await?;
        self.output_message(&json!({
            "type": "RESPONSE",
            "response": {
                "status": response.status(),
                "body": response_body(&response),
            }
        }));
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// `~/.session-client/tokens.json`, when a home directory is known
fn default_token_file() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(DEFAULT_TOKEN_FILE))
}

/// Parse an HTTP method name
pub(crate) fn parse_method(method: &str) -> Result<Method> {
    let method = method.to_ascii_uppercase();
    match method.as_str() {
        "GET" | "POST" | "PUT" | "PATCH" | "DELETE" | "HEAD" | "OPTIONS" => {
            Method::from_bytes(method.as_bytes())
                .map_err(|e| Error::invalid_request(format!("Invalid method '{method}': {e}")))
        }
        _ => Err(Error::invalid_request(format!(
            "Unsupported method '{method}'"
        ))),
    }
}

/// Parse a `key=value` query argument
pub(crate) fn parse_query_pair(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(Error::invalid_request(format!(
            "Invalid query parameter '{pair}', expected KEY=VALUE"
        ))),
    }
}

/// JSON body when the response has one, text otherwise
fn response_body(response: &ApiResponse) -> Value {
    if response.bytes().is_empty() {
        return Value::Null;
    }
    response
        .json::<Value>()
        .unwrap_or_else(|_| Value::String(response.text()))
}
