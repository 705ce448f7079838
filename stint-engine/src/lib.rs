//! Client-side reconciliation engine for the Stint internship platform.
//!
//! The engine keeps an in-memory mirror of the remote collections and
//! routes every change through a confirmed-write applier: the gateway
//! write happens first, and the mirror commits the record the server
//! returned. Sessions are managed by the [`SessionController`], which
//! resolves provider identities to profiles (repairing id drift along
//! the way), hydrates the mirror on establishment and reacts to the
//! provider's session events. Derived rules (badge awards) run after
//! the mutations that can trigger them.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stint_engine::{EngineConfig, SessionController};
//! use stint_gateway::{GatewayConfig, HttpGateway, RemoteGateway};
//!
//! # async fn example() -> Result<(), stint_engine::EngineError> {
//! let gateway: Arc<dyn RemoteGateway> = Arc::new(HttpGateway::new(GatewayConfig {
//!     base_url: "https://project.example.co".into(),
//!     api_key: "anon-key".into(),
//!     ..Default::default()
//! }));
//!
//! let controller = SessionController::new(gateway, EngineConfig::new());
//! controller.clone().start();
//! controller.bootstrap().await?;
//!
//! if let Some(profile) = controller.current_user() {
//!     println!("signed in as {}", profile.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod entities;
pub mod error;
pub mod mirror;
pub mod mutation;
pub mod permissions;
pub mod rules;
pub mod session;

pub use config::{EngineConfig, AVATAR_SERVICE_URL, DEFAULT_HOURS_REQUIRED};
pub use error::{EngineError, Result};
pub use mirror::{MirrorCollection, MirrorEntity, MirrorStore};
pub use mutation::Mutations;
pub use permissions::{has_permission, Permission};
pub use session::{RegistrationOutcome, SessionController};
