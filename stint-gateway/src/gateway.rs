//! The remote gateway contract.
//!
//! This trait is the engine's entire view of the outside world: the
//! authentication provider plus collection-scoped CRUD against the durable
//! store. Rows cross the boundary as raw `serde_json::Value`s; turning them
//! into typed entities is the caller's job (the entity mapper in
//! `stint-engine`), never the gateway's.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::Result;
use crate::types::{Filter, Session, SessionEvent, SignUpResult};

/// Boundary abstraction over the persistent store and the auth provider.
///
/// Implementations: [`crate::HttpGateway`] for the hosted REST backend,
/// [`crate::MemoryGateway`] for tests and local development.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Return the currently restored session, if any.
    ///
    /// This is a local question to the gateway (token storage), not a
    /// network round trip, and never fails on an absent session.
    async fn get_session(&self) -> Result<Option<Session>>;

    /// Authenticate with email and password.
    ///
    /// On success the gateway holds the session for subsequent calls and
    /// emits [`SessionEvent::SignedIn`].
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Register a new identity with the auth provider.
    ///
    /// Providers requiring email confirmation return no session; the
    /// identity exists either way.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResult>;

    /// Invalidate the current session. Emits [`SessionEvent::SignedOut`].
    async fn sign_out(&self) -> Result<()>;

    /// Take the single-consumer session-event receiver.
    ///
    /// The first call returns the receiver; every later call returns `None`.
    /// Events are delivered in emission order and must be processed by one
    /// consumer only.
    fn subscribe_session_events(&self) -> Option<UnboundedReceiver<SessionEvent>>;

    /// Find at most one row matching the filter.
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Option<Value>>;

    /// Insert a row and return the stored representation.
    ///
    /// A uniqueness conflict surfaces as
    /// [`crate::GatewayError::UniqueViolation`], distinguishable from all
    /// other failures.
    async fn insert(&self, collection: &str, payload: Value) -> Result<Value>;

    /// Update the row(s) matching the filter with the given patch and return
    /// the updated representation. `NotFound` if nothing matched.
    async fn update(&self, collection: &str, filter: &Filter, patch: Value) -> Result<Value>;

    /// Delete a row by id. Deleting an absent id is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Fetch every row of a collection.
    async fn list_all(&self, collection: &str) -> Result<Vec<Value>>;
}
