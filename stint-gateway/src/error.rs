//! Error types for gateway operations.

use thiserror::Error;

/// Postgres error class for unique-constraint violations, as surfaced in
/// PostgREST error bodies.
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

/// Remote gateway error
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Authentication provider rejected the operation (bad credentials,
    /// duplicate sign-up, expired token)
    #[error("Auth error: {0}")]
    Auth(String),

    /// Insert or update violated a uniqueness constraint
    #[error("Unique violation on {collection}: {message}")]
    UniqueViolation { collection: String, message: String },

    /// No row matched the request
    #[error("Not found: {0}")]
    NotFound(String),

    /// Gateway is unreachable (network down, transport refused)
    #[error("Gateway offline: {0}")]
    Offline(String),

    /// Server returned an error
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// Whether this error is the distinguishable uniqueness-violation kind.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, GatewayError::UniqueViolation { .. })
    }

    /// Whether this error means the addressed row does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
