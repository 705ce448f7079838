//! Account recovery: emailed one-time reset codes.
//!
//! `begin` checks that the address belongs to a profile, mints a
//! four-digit code, holds it for in-session verification and hands it
//! to the configured webhook for delivery. The engine never sends mail
//! itself; the webhook owns transport, and its failures are logged
//! without failing the flow that already holds the code.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::Rng;
use serde_json::json;
use tracing::{debug, warn};

use stint_gateway::{Filter, RemoteGateway};

use crate::entities::{Collection, Profile};
use crate::error::{EngineError, Result};
use crate::mirror::MirrorEntity;

pub(crate) struct PasswordRecovery {
    webhook_url: Option<String>,
    http: reqwest::Client,
    codes: Mutex<HashMap<String, String>>,
}

impl PasswordRecovery {
    pub(crate) fn new(webhook_url: Option<String>) -> Self {
        PasswordRecovery {
            webhook_url,
            http: reqwest::Client::new(),
            codes: Mutex::new(HashMap::new()),
        }
    }

    /// Start a reset for `email`.
    ///
    /// Succeeds once the code is held; delivery runs on a background
    /// task. `UnknownEmail` when no profile carries the address.
    pub(crate) async fn begin(&self, gateway: &dyn RemoteGateway, email: &str) -> Result<()> {
        let record = gateway
            .find(Collection::Users.as_str(), &Filter::eq("email", email))
            .await?
            .ok_or(EngineError::UnknownEmail)?;
        let profile = Profile::from_record(&record);

        let code = rand::thread_rng().gen_range(1000..=9999).to_string();
        self.codes
            .lock()
            .unwrap()
            .insert(email.to_string(), code.clone());

        let Some(url) = self.webhook_url.clone() else {
            debug!(%email, "no reset webhook configured, code held locally");
            return Ok(());
        };
        let http = self.http.clone();
        let payload = json!({
            "email": email,
            "name": profile.name,
            "resetCode": code,
        });
        tokio::spawn(async move {
            match http.post(&url).json(&payload).send().await {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => {
                    warn!(status = %response.status(), "reset webhook rejected delivery");
                }
                Err(error) => warn!(%error, "reset webhook unreachable"),
            }
        });
        Ok(())
    }

    /// Check a submitted code against the held one.
    ///
    /// A correct code is consumed; a wrong one stays pending so the
    /// user can retype it.
    pub(crate) fn verify(&self, email: &str, code: &str) -> Result<()> {
        let mut codes = self.codes.lock().unwrap();
        match codes.get(email) {
            Some(held) if held == code => {
                codes.remove(email);
                Ok(())
            }
            _ => Err(EngineError::InvalidResetCode),
        }
    }

    #[cfg(test)]
    pub(crate) fn held_code(&self, email: &str) -> Option<String> {
        self.codes.lock().unwrap().get(email).cloned()
    }
}
