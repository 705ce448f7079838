//! HTTP gateway for the hosted REST backend.
//!
//! Speaks the backend's two surfaces: the auth provider
//! (`/auth/v1/token`, `/auth/v1/signup`, `/auth/v1/logout`) and row-level
//! REST over the relational store (`/rest/v1/{collection}` with
//! `field=eq.value` filters). Uniqueness violations arrive as Postgres
//! error class `23505` in the JSON error body and are mapped to
//! [`GatewayError::UniqueViolation`] so callers can react to identity races.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde_json::Value;
use std::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{GatewayError, Result, UNIQUE_VIOLATION_CODE};
use crate::gateway::RemoteGateway;
use crate::types::{Filter, Identity, Session, SessionEvent, SignUpResult};

/// Configuration for [`HttpGateway`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the backend, without a trailing slash
    pub base_url: String,
    /// Project API key, sent as `apikey` and as the anonymous bearer
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

/// HTTP client for the remote gateway.
///
/// # Example
///
/// ```rust,no_run
/// use stint_gateway::{GatewayConfig, HttpGateway};
///
/// let gateway = HttpGateway::new(GatewayConfig {
///     base_url: "https://project.example.co".into(),
///     api_key: "anon-key".into(),
///     ..Default::default()
/// });
/// ```
pub struct HttpGateway {
    config: GatewayConfig,
    client: Client,
    session: RwLock<Option<Session>>,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: Mutex<Option<UnboundedReceiver<SessionEvent>>>,
}

impl HttpGateway {
    /// Create a new gateway client.
    pub fn new(config: GatewayConfig) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Ok(value) = header::HeaderValue::from_str(&config.api_key) {
            headers.insert("apikey", value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            config,
            client,
            session: RwLock::new(None),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// Seed a session persisted from a previous run, so `get_session`
    /// restores it instead of starting unauthenticated.
    pub fn with_restored_session(mut self, session: Session) -> Self {
        self.session = RwLock::new(Some(session));
        self
    }

    fn rest_url(&self, collection: &str, filter: Option<&Filter>) -> String {
        let mut url = format!("{}/rest/v1/{}", self.config.base_url, collection);
        match filter {
            Some(f) if !f.clauses().is_empty() => {
                url.push('?');
                url.push_str(&f.to_query());
                url.push_str("&select=*");
            }
            _ => url.push_str("?select=*"),
        }
        url
    }

    async fn bearer(&self) -> String {
        let session = self.session.read().await;
        let token = session
            .as_ref()
            .map(|s| s.access_token.as_str())
            .unwrap_or(&self.config.api_key);
        format!("Bearer {}", token)
    }

    fn emit(&self, event: SessionEvent) {
        // Receiver may be dropped or never taken; emission is best-effort.
        let _ = self.events_tx.send(event);
    }

    /// Map a non-success response to a `GatewayError`, recognizing the
    /// uniqueness-violation class in the error body.
    async fn error_from_response(&self, collection: &str, response: Response) -> GatewayError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

        let code = parsed.get("code").and_then(|v| v.as_str()).unwrap_or("");
        let message = parsed
            .get("message")
            .and_then(|v| v.as_str())
            .or_else(|| parsed.get("msg").and_then(|v| v.as_str()))
            .or_else(|| parsed.get("error_description").and_then(|v| v.as_str()))
            .unwrap_or(&body)
            .to_string();

        if code == UNIQUE_VIOLATION_CODE {
            return GatewayError::UniqueViolation {
                collection: collection.to_string(),
                message,
            };
        }

        GatewayError::Server { status, message }
    }

    async fn auth_error(&self, response: Response) -> GatewayError {
        let body = response.text().await.unwrap_or_default();
        let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        let message = parsed
            .get("error_description")
            .and_then(|v| v.as_str())
            .or_else(|| parsed.get("msg").and_then(|v| v.as_str()))
            .or_else(|| parsed.get("message").and_then(|v| v.as_str()))
            .unwrap_or(&body)
            .to_string();
        GatewayError::Auth(message)
    }

    fn identity_from_user(user: &Value) -> Identity {
        Identity::new(
            user.get("id").and_then(|v| v.as_str()).unwrap_or_default(),
            user.get("email").and_then(|v| v.as_str()).unwrap_or_default(),
        )
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let url = format!(
            "{}/auth/v1/token?grant_type=password",
            self.config.base_url
        );

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.auth_error(response).await);
        }

        let body: Value = response.json().await?;
        let access_token = body
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| GatewayError::Auth("token response missing access_token".into()))?
            .to_string();
        let user = body
            .get("user")
            .ok_or_else(|| GatewayError::Auth("token response missing user".into()))?;

        let session = Session::new(Self::identity_from_user(user), access_token);
        *self.session.write().await = Some(session.clone());

        debug!(auth_id = %session.identity.auth_id, "signed in");
        self.emit(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResult> {
        let url = format!("{}/auth/v1/signup", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.auth_error(response).await);
        }

        // With auto-confirm the provider answers with a full session
        // (access_token + user); with email confirmation it answers with
        // the bare user object.
        let body: Value = response.json().await?;
        let (identity, session) = match body.get("access_token").and_then(|v| v.as_str()) {
            Some(token) => {
                let user = body
                    .get("user")
                    .ok_or_else(|| GatewayError::Auth("signup response missing user".into()))?;
                let identity = Self::identity_from_user(user);
                (identity.clone(), Some(Session::new(identity, token)))
            }
            None => (Self::identity_from_user(&body), None),
        };

        if let Some(ref session) = session {
            *self.session.write().await = Some(session.clone());
            self.emit(SessionEvent::SignedIn(session.clone()));
        }

        Ok(SignUpResult { identity, session })
    }

    async fn sign_out(&self) -> Result<()> {
        let url = format!("{}/auth/v1/logout", self.config.base_url);
        let bearer = self.bearer().await;

        // Drop the local session before the round trip; the token is dead to
        // this client either way.
        *self.session.write().await = None;

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, bearer)
            .send()
            .await?;

        self.emit(SessionEvent::SignedOut);

        if !response.status().is_success() && response.status() != StatusCode::UNAUTHORIZED {
            return Err(self.error_from_response("auth", response).await);
        }
        Ok(())
    }

    fn subscribe_session_events(&self) -> Option<UnboundedReceiver<SessionEvent>> {
        self.events_rx
            .lock()
            .ok()
            .and_then(|mut guard| guard.take())
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Option<Value>> {
        let url = self.rest_url(collection, Some(filter));
        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, self.bearer().await)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(collection, response).await);
        }

        let mut rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }

    async fn insert(&self, collection: &str, payload: Value) -> Result<Value> {
        let url = self.rest_url(collection, None);
        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, self.bearer().await)
            .header("Prefer", "return=representation")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(collection, response).await);
        }

        let mut rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            return Err(GatewayError::Server {
                status: 200,
                message: format!("insert into {} returned no representation", collection),
            });
        }
        Ok(rows.remove(0))
    }

    async fn update(&self, collection: &str, filter: &Filter, patch: Value) -> Result<Value> {
        let url = self.rest_url(collection, Some(filter));
        let response = self
            .client
            .patch(&url)
            .header(header::AUTHORIZATION, self.bearer().await)
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(collection, response).await);
        }

        let mut rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            return Err(GatewayError::NotFound(format!(
                "{} where {}",
                collection,
                filter.to_query()
            )));
        }
        Ok(rows.remove(0))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let url = self.rest_url(collection, Some(&Filter::by_id(id)));
        let response = self
            .client
            .delete(&url)
            .header(header::AUTHORIZATION, self.bearer().await)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(collection, response).await);
        }
        Ok(())
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<Value>> {
        let url = self.rest_url(collection, None);
        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, self.bearer().await)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(collection, response).await);
        }

        Ok(response.json().await?)
    }
}
