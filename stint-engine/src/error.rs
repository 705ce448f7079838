//! Engine error types.
//!
//! Display strings double as the user-facing messages, so the account
//! gates read as sentences rather than diagnostics.

use stint_gateway::GatewayError;
use thiserror::Error;

/// Engine error
#[derive(Debug, Error)]
pub enum EngineError {
    /// Remote gateway call failed
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Sign-in or sign-up rejected by the auth provider
    #[error("{0}")]
    Credentials(String),

    /// Supervisor account awaiting admin approval
    #[error("Your supervisor account is pending Admin approval.")]
    PendingApproval,

    /// Account was reviewed and rejected
    #[error("Your account registration was rejected.")]
    RegistrationRejected,

    /// Pre-provisioned profile could not be linked to the identity
    #[error("Account linking failed: {0}")]
    ProfileLink(String),

    /// Fresh profile row could not be created
    #[error("Account setup failed: {0}")]
    ProfileCreation(String),

    /// Authenticated identity has no resolvable profile
    #[error("Account state error: {0}")]
    AccountState(String),

    /// Operation requires an authenticated session
    #[error("No active session")]
    NotAuthenticated,

    /// Password reset requested for an unknown address
    #[error("No account found for this email.")]
    UnknownEmail,

    /// Reset code mismatch or already consumed
    #[error("Invalid or expired reset code.")]
    InvalidResetCode,
}

impl EngineError {
    /// True for the two account gates that force a sign-out.
    pub fn is_account_gate(&self) -> bool {
        matches!(
            self,
            EngineError::PendingApproval | EngineError::RegistrationRejected
        )
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_gates_are_classified() {
        assert!(EngineError::PendingApproval.is_account_gate());
        assert!(EngineError::RegistrationRejected.is_account_gate());
        assert!(!EngineError::NotAuthenticated.is_account_gate());
        assert!(!EngineError::Credentials("bad password".to_string()).is_account_gate());
    }

    #[test]
    fn test_gate_messages_read_as_sentences() {
        assert_eq!(
            EngineError::PendingApproval.to_string(),
            "Your supervisor account is pending Admin approval."
        );
        assert_eq!(
            EngineError::RegistrationRejected.to_string(),
            "Your account registration was rejected."
        );
        assert_eq!(
            EngineError::InvalidResetCode.to_string(),
            "Invalid or expired reset code."
        );
    }
}
