use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::Result;
use crate::client::post_operation;
use crate::config::Credentials;
use crate::graphql;
use crate::logger::MessageLogger;

pub(crate) const DEFAULT_TOKEN_TTL_SECS: i64 = 12 * 3600;

/// One authenticated vendor session. Handed out by value; the canonical copy
/// lives inside [`TokenManager`].
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub property_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Owns the session credential and serializes refreshes.
///
/// The expiry check and the vendor login both run under one async mutex, so
/// concurrent callers of [`get_valid_session`](Self::get_valid_session)
/// collapse into a single in-flight login and all receive the resulting
/// session. The vendor rate-limits the login endpoint; parallel refreshes
/// would trip it.
pub struct TokenManager {
    http: reqwest::Client,
    base_url: String,
    endpoint: String,
    credentials: Credentials,
    ttl: Duration,
    session: Mutex<Option<Session>>,
    logger: Option<Arc<StdMutex<MessageLogger>>>,
}

impl TokenManager {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: String,
        credentials: Credentials,
        ttl: Duration,
        logger: Option<Arc<StdMutex<MessageLogger>>>,
    ) -> Self {
        let endpoint = format!("{}{}", base_url, graphql::GRAPHQL_PATH);
        Self {
            http,
            base_url,
            endpoint,
            credentials,
            ttl,
            session: Mutex::new(None),
            logger,
        }
    }

    /// Return a non-expired session, logging in first if the current one is
    /// expired or absent. A login failure surfaces to the caller; it is not
    /// retried here.
    pub async fn get_valid_session(&self) -> Result<Session> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref()
            && !session.is_expired()
        {
            return Ok(session.clone());
        }

        if guard.is_some() {
            debug!("session expired, logging in again");
        }
        let session = self.login().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Drop the current session so the next call refreshes. Used after the
    /// vendor rejects a token that has not reached its nominal expiry.
    pub async fn invalidate(&self) {
        *self.session.lock().await = None;
    }

    async fn login(&self) -> Result<Session> {
        // Plain GET against the site root first; the vendor sets the CSRF
        // cookie there and the login mutation fails without it.
        debug!(url = %self.base_url, "fetching CSRF cookie");
        self.http
            .get(&self.base_url)
            .send()
            .await?
            .error_for_status()?;

        let op = graphql::login_operation(&self.credentials.email, &self.credentials.password);
        self.log(|logger| {
            logger.log_operation(
                graphql::operation_name(&op),
                op.get("variables").unwrap_or(&Value::Null),
            );
        });
        let body = post_operation(&self.http, &self.endpoint, None, &op).await?;
        self.log(|logger| logger.log_response(graphql::operation_name(&op), &body));
        let (token, user_id, property_id) = graphql::parse_login(&body)?;

        debug!(user_id, property_id, "login successful");
        Ok(Session {
            token,
            user_id,
            property_id,
            expires_at: Utc::now() + self.ttl,
        })
    }

    fn log(&self, f: impl FnOnce(&mut MessageLogger)) {
        if let Some(logger) = &self.logger
            && let Ok(mut logger) = logger.lock()
        {
            f(&mut logger);
        }
    }
}
