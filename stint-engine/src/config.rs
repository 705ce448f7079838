//! Engine configuration.

/// Hour quota applied when a profile row carries none.
pub const DEFAULT_HOURS_REQUIRED: u32 = 120;

/// Generated-avatar service used when a profile has no stored avatar URL.
pub const AVATAR_SERVICE_URL: &str = "https://ui-avatars.com/api/";

/// Engine settings. `Default` yields a working engine; the webhook is the
/// only deployment-specific piece.
#[derive(Clone, Debug, Default)]
pub struct EngineConfig {
    /// Endpoint that receives `{email, name, resetCode}` when a password
    /// reset begins. `None` skips delivery; codes stay verifiable
    /// in-session either way.
    pub reset_webhook_url: Option<String>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reset_webhook(mut self, url: impl Into<String>) -> Self {
        self.reset_webhook_url = Some(url.into());
        self
    }
}
