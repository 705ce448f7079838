//! Shared types for the remote gateway boundary.
//!
//! Everything that crosses the wire is either one of these auth-side types
//! or a raw `serde_json::Value` row. Typed domain entities live upstream in
//! `stint-engine`; the gateway deliberately does not know about them.

use serde::{Deserialize, Serialize};

/// An authentication-provider account.
///
/// The `auth_id` is the provider's opaque user id. Application profiles are
/// keyed by this id once identity resolution has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-side user id
    #[serde(rename = "id")]
    pub auth_id: String,
    /// Account email
    pub email: String,
}

impl Identity {
    /// Create an identity from its parts.
    pub fn new(auth_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            auth_id: auth_id.into(),
            email: email.into(),
        }
    }

    /// The local part of the account email, used as a fallback display name.
    pub fn email_local_part(&self) -> &str {
        self.email.split('@').next().unwrap_or("User")
    }
}

/// An authenticated provider session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The identity this session belongs to
    pub identity: Identity,
    /// Bearer token for subsequent calls
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

impl Session {
    /// Create a session for an identity.
    pub fn new(identity: Identity, access_token: impl Into<String>) -> Self {
        Self {
            identity,
            access_token: access_token.into(),
        }
    }
}

/// Result of a sign-up call.
///
/// Providers configured with email confirmation create the identity but
/// return no session; the caller must treat `session: None` as
/// "registered, not signed in".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpResult {
    /// The newly created identity
    pub identity: Identity,
    /// Immediate session, when the provider grants one
    pub session: Option<Session>,
}

/// Asynchronous session-change event.
///
/// Emitted by gateway implementations after their own auth operations
/// succeed, independent of the call that triggered them. Consumed through a
/// single-consumer channel (see [`crate::RemoteGateway::subscribe_session_events`]).
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A session was established
    SignedIn(Session),
    /// The session ended
    SignedOut,
}

/// A conjunction of field equalities for `find` / `update` calls.
///
/// The engine only ever addresses rows by exact field matches (by id, by
/// email), so the filter language is deliberately that small.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<(String, String)>,
}

impl Filter {
    /// Filter on a single field equality.
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::default().and_eq(field, value)
    }

    /// Filter on a row id.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::eq("id", id)
    }

    /// Add another equality clause.
    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    /// The equality clauses, in insertion order.
    pub fn clauses(&self) -> &[(String, String)] {
        &self.clauses
    }

    /// Whether a JSON row satisfies every clause.
    ///
    /// Non-string row values are compared through their JSON display form so
    /// numeric ids still match.
    pub fn matches(&self, row: &serde_json::Value) -> bool {
        self.clauses.iter().all(|(field, expected)| {
            match row.get(field) {
                Some(serde_json::Value::String(s)) => s == expected,
                Some(serde_json::Value::Null) | None => false,
                Some(other) => other.to_string() == *expected,
            }
        })
    }

    /// Render as PostgREST-style query parameters (`field=eq.value`).
    pub fn to_query(&self) -> String {
        self.clauses
            .iter()
            .map(|(field, value)| format!("{}=eq.{}", field, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
