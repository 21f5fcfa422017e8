use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;

use crate::config::Credentials;
use crate::graphql;
use crate::logger::{MessageLogMode, MessageLogger};
use crate::token::{DEFAULT_TOKEN_TTL_SECS, Session, TokenManager};
use crate::types::{Device, HeatingMode, Room};
use crate::{Error, Result};

pub struct TikoClientBuilder {
    credentials: Credentials,
    base_url: String,
    token_ttl: chrono::Duration,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl TikoClientBuilder {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(email, password),
            base_url: graphql::DEFAULT_BASE_URL.to_string(),
            token_ttl: chrono::Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            log_mode: None,
            log_path: None,
        }
    }

    /// Override the vendor endpoint. Used by tests against a local mock.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// How long a fresh token is trusted before the next call re-logs-in.
    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl =
            chrono::Duration::from_std(ttl).expect("token TTL out of range");
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> TikoClient {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(graphql::ACCEPT));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(graphql::ACCEPT_LANGUAGE),
        );
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(graphql::USER_AGENT),
        );
        if let Ok(origin) = HeaderValue::from_str(&self.base_url) {
            headers.insert(header::ORIGIN, origin);
        }
        if let Ok(referer) = HeaderValue::from_str(&format!("{}/dashboard/", self.base_url)) {
            headers.insert(header::REFERER, referer);
        }

        // Cookie store is required: login only succeeds with the CSRF cookie
        // handed out by the site root.
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .expect("failed to build HTTP client");

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(Arc::new(Mutex::new(
                MessageLogger::new(mode, &path).expect("failed to open log file"),
            ))),
            _ => None,
        };

        let endpoint = format!("{}{}", self.base_url, graphql::GRAPHQL_PATH);
        TikoClient {
            tokens: TokenManager::new(
                http.clone(),
                self.base_url,
                self.credentials,
                self.token_ttl,
                logger.clone(),
            ),
            http,
            endpoint,
            logger,
        }
    }
}

/// Stateless wrapper around the vendor GraphQL API. Methods take `&self` so
/// one client can serve overlapping host callbacks; the only shared state is
/// the session inside [`TokenManager`].
pub struct TikoClient {
    http: reqwest::Client,
    endpoint: String,
    tokens: TokenManager,
    logger: Option<Arc<Mutex<MessageLogger>>>,
}

impl TikoClient {
    pub fn builder(email: impl Into<String>, password: impl Into<String>) -> TikoClientBuilder {
        TikoClientBuilder::new(email, password)
    }

    /// Force a login now. Useful for credential validation; regular calls
    /// authenticate lazily.
    pub async fn authenticate(&self) -> Result<()> {
        self.tokens.get_valid_session().await.map(|_| ())
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.tokens
    }

    pub async fn list_rooms(&self) -> Result<Vec<Room>> {
        let body = self
            .execute(|session| graphql::rooms_operation(session.property_id))
            .await?;
        graphql::parse_rooms(&body)
    }

    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        let body = self
            .execute(|session| graphql::devices_operation(session.property_id))
            .await?;
        graphql::parse_devices(&body)
    }

    /// Set the target temperature for one room, in degrees Celsius.
    pub async fn set_temperature(&self, room_id: i64, temperature: f64) -> Result<()> {
        self.execute(|session| {
            graphql::adjust_temperature_operation(session.property_id, room_id, temperature)
        })
        .await
        .map(|_| ())
    }

    /// Set the heating mode for one room.
    pub async fn set_mode(&self, room_id: i64, mode: HeatingMode) -> Result<()> {
        self.execute(|session| graphql::room_mode_operation(session.property_id, room_id, mode))
            .await
            .map(|_| ())
    }

    /// Run one operation with a valid token. An unauthorized response gets
    /// exactly one invalidate-refresh-retry; a second rejection surfaces.
    async fn execute<F>(&self, build: F) -> Result<Value>
    where
        F: Fn(&Session) -> Value,
    {
        let session = self.tokens.get_valid_session().await?;
        let op = build(&session);
        self.log_operation(&op);

        match post_operation(&self.http, &self.endpoint, Some(&session.token), &op).await {
            Err(Error::Unauthorized(msg)) => {
                debug!(reason = %msg, "vendor rejected token, re-authenticating once");
                self.tokens.invalidate().await;
                let session = self.tokens.get_valid_session().await?;
                // Property id may differ after re-login; rebuild the operation.
                let op = build(&session);
                let body =
                    post_operation(&self.http, &self.endpoint, Some(&session.token), &op).await?;
                self.log_response(&op, &body);
                Ok(body)
            }
            Ok(body) => {
                self.log_response(&op, &body);
                Ok(body)
            }
            Err(e) => Err(e),
        }
    }

    fn log_operation(&self, op: &Value) {
        if let Some(logger) = &self.logger
            && let Ok(mut logger) = logger.lock()
        {
            logger.log_operation(
                graphql::operation_name(op),
                op.get("variables").unwrap_or(&Value::Null),
            );
        }
    }

    fn log_response(&self, op: &Value, body: &Value) {
        if let Some(logger) = &self.logger
            && let Ok(mut logger) = logger.lock()
        {
            logger.log_response(graphql::operation_name(op), body);
        }
    }
}

/// POST one GraphQL operation and map the failure modes: HTTP 401/403 is
/// unauthorized, other HTTP failures stay transport errors, and GraphQL
/// `errors` entries go through [`graphql::check_errors`].
pub(crate) async fn post_operation(
    http: &reqwest::Client,
    endpoint: &str,
    token: Option<&str>,
    op: &Value,
) -> Result<Value> {
    let mut request = http.post(endpoint).json(op);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Token {token}"));
    }

    let response = request.send().await?;
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::Unauthorized(format!("HTTP {}", status.as_u16())));
    }
    let response = response.error_for_status()?;

    let body: Value = response.json().await?;
    graphql::check_errors(&body)?;
    Ok(body)
}
