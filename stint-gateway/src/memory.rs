//! In-memory gateway for tests and local development.
//!
//! Implements the full [`RemoteGateway`] contract against `DashMap` tables:
//! server-side id minting, email uniqueness on the `users` collection
//! (surfaced as the same `23505`-class error the real backend raises),
//! credential checking, and session-event emission. Fault switches let tests
//! drive the engine through failure paths without a network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::error::{GatewayError, Result};
use crate::gateway::RemoteGateway;
use crate::types::{Filter, Identity, Session, SessionEvent, SignUpResult};

#[derive(Debug, Clone)]
struct Credentials {
    auth_id: String,
    password: String,
}

/// In-memory implementation of the remote gateway.
pub struct MemoryGateway {
    tables: DashMap<String, DashMap<String, Value>>,
    accounts: DashMap<String, Credentials>,
    session: Mutex<Option<Session>>,
    auto_confirm: bool,
    offline: AtomicBool,
    fail_next_insert: AtomicBool,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: Mutex<Option<UnboundedReceiver<SessionEvent>>>,
}

impl MemoryGateway {
    /// Create an empty gateway.
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            tables: DashMap::new(),
            accounts: DashMap::new(),
            session: Mutex::new(None),
            auto_confirm: true,
            offline: AtomicBool::new(false),
            fail_next_insert: AtomicBool::new(false),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// Require email confirmation: `sign_up` creates the identity but
    /// returns no session.
    pub fn with_email_confirmation(mut self) -> Self {
        self.auto_confirm = false;
        self
    }

    /// Register an auth account with a fixed auth id, without creating any
    /// profile row. Lets tests stage identity/profile divergence.
    pub fn register_identity(&self, email: &str, password: &str, auth_id: &str) {
        self.accounts.insert(
            email.to_string(),
            Credentials {
                auth_id: auth_id.to_string(),
                password: password.to_string(),
            },
        );
    }

    /// Seed an object row directly, bypassing gateway semantics. Mints an
    /// id when the row has none.
    pub fn seed(&self, collection: &str, mut row: Value) -> String {
        let id = match row.get("id").and_then(|v| v.as_str()) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                if let Value::Object(ref mut fields) = row {
                    fields.insert("id".to_string(), Value::String(id.clone()));
                }
                id
            }
        };
        self.table(collection).insert(id.clone(), row);
        id
    }

    /// Snapshot of a collection's rows.
    pub fn rows(&self, collection: &str) -> Vec<Value> {
        self.table(collection)
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of rows in a collection.
    pub fn row_count(&self, collection: &str) -> usize {
        self.table(collection).len()
    }

    /// Toggle the offline switch; while set, every operation fails with
    /// [`GatewayError::Offline`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Arm a one-shot server failure for the next insert.
    pub fn fail_next_insert(&self) {
        self.fail_next_insert.store(true, Ordering::SeqCst);
    }

    /// Establish a session directly, as if restored from persisted tokens.
    pub fn restore_session(&self, identity: Identity) {
        let session = Session::new(identity, Uuid::new_v4().to_string());
        *self.session.lock().unwrap() = Some(session);
    }

    fn table(&self, collection: &str) -> dashmap::mapref::one::Ref<'_, String, DashMap<String, Value>> {
        if let Some(table) = self.tables.get(collection) {
            return table;
        }
        self.tables
            .entry(collection.to_string())
            .or_default()
            .downgrade()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Offline("gateway offline".to_string()));
        }
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Enforce the `users` table's unique constraints (email, primary-key
    /// id) the way the backend's Postgres schema does.
    fn check_users_uniqueness(
        collection: &str,
        table: &DashMap<String, Value>,
        row: &Value,
        exempt_id: Option<&str>,
    ) -> Result<()> {
        if collection != "users" {
            return Ok(());
        }
        let email = row.get("email").and_then(|v| v.as_str());
        let id = row.get("id").and_then(|v| v.as_str());

        for entry in table.iter() {
            if exempt_id.is_some() && exempt_id == entry.value().get("id").and_then(|v| v.as_str())
            {
                continue;
            }
            let taken_email = entry.value().get("email").and_then(|v| v.as_str());
            if email.is_some() && taken_email == email {
                return Err(GatewayError::UniqueViolation {
                    collection: collection.to_string(),
                    message: "duplicate key value violates unique constraint \"users_email_key\""
                        .to_string(),
                });
            }
            if id.is_some() && Some(entry.key().as_str()) == id {
                return Err(GatewayError::UniqueViolation {
                    collection: collection.to_string(),
                    message: "duplicate key value violates unique constraint \"users_pkey\""
                        .to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteGateway for MemoryGateway {
    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(self.session.lock().unwrap().clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        self.check_online()?;

        let account = self
            .accounts
            .get(email)
            .filter(|account| account.password == password)
            .map(|account| account.clone())
            .ok_or_else(|| GatewayError::Auth("Invalid login credentials".to_string()))?;

        let session = Session::new(
            Identity::new(account.auth_id, email),
            Uuid::new_v4().to_string(),
        );
        *self.session.lock().unwrap() = Some(session.clone());
        self.emit(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResult> {
        self.check_online()?;

        if self.accounts.contains_key(email) {
            return Err(GatewayError::Auth("User already registered".to_string()));
        }

        let auth_id = Uuid::new_v4().to_string();
        self.accounts.insert(
            email.to_string(),
            Credentials {
                auth_id: auth_id.clone(),
                password: password.to_string(),
            },
        );

        let identity = Identity::new(auth_id, email);
        if !self.auto_confirm {
            return Ok(SignUpResult {
                identity,
                session: None,
            });
        }

        let session = Session::new(identity.clone(), Uuid::new_v4().to_string());
        *self.session.lock().unwrap() = Some(session.clone());
        self.emit(SessionEvent::SignedIn(session.clone()));
        Ok(SignUpResult {
            identity,
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> Result<()> {
        self.check_online()?;
        *self.session.lock().unwrap() = None;
        self.emit(SessionEvent::SignedOut);
        Ok(())
    }

    fn subscribe_session_events(&self) -> Option<UnboundedReceiver<SessionEvent>> {
        self.events_rx
            .lock()
            .ok()
            .and_then(|mut guard| guard.take())
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Option<Value>> {
        self.check_online()?;
        let table = self.table(collection);
        let found = table
            .iter()
            .find(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone());
        Ok(found)
    }

    async fn insert(&self, collection: &str, mut payload: Value) -> Result<Value> {
        self.check_online()?;

        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Server {
                status: 500,
                message: "injected insert failure".to_string(),
            });
        }

        if !payload.is_object() {
            return Err(GatewayError::Server {
                status: 400,
                message: format!("insert into {} requires an object payload", collection),
            });
        }

        let table = self.table(collection);
        Self::check_users_uniqueness(collection, &table, &payload, None)?;

        let id = match payload.get("id").and_then(|v| v.as_str()) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                payload["id"] = Value::String(id.clone());
                id
            }
        };

        table.insert(id, payload.clone());
        Ok(payload)
    }

    async fn update(&self, collection: &str, filter: &Filter, patch: Value) -> Result<Value> {
        self.check_online()?;

        let table = self.table(collection);
        let matched = table
            .iter()
            .find(|entry| filter.matches(entry.value()))
            .map(|entry| (entry.key().clone(), entry.value().clone()));

        let (old_id, mut row) = matched.ok_or_else(|| {
            GatewayError::NotFound(format!("{} where {}", collection, filter.to_query()))
        })?;

        if let (Value::Object(fields), Value::Object(patch_fields)) = (&mut row, &patch) {
            for (key, value) in patch_fields {
                fields.insert(key.clone(), value.clone());
            }
        }

        Self::check_users_uniqueness(collection, &table, &row, Some(old_id.as_str()))?;

        let new_id = row
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or(&old_id)
            .to_string();
        if new_id != old_id {
            table.remove(&old_id);
        }
        table.insert(new_id, row.clone());
        Ok(row)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.check_online()?;
        self.table(collection).remove(id);
        Ok(())
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<Value>> {
        self.check_online()?;
        Ok(self.rows(collection))
    }
}
