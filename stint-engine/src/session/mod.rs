//! Session lifecycle: restore, sign-in, registration, sign-out, and the
//! session-event worker.
//!
//! The [`SessionController`] is the engine's front door. It owns the
//! gateway, the mirror and the mutation applier, resolves provider
//! identities to application profiles, and keeps local state consistent
//! with the provider's session events.

mod controller;
mod recovery;
mod resolver;

pub use controller::{RegistrationOutcome, SessionController};

/// Placeholder written to the profile row's legacy `password` column.
/// Credentials live with the auth provider; the column is kept only
/// because the backend schema requires it to be non-null.
pub(crate) const AUTH_MANAGED_PASSWORD: &str = "managed_by_auth_provider";
