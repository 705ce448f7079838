//! Remote gateway contract and clients for the Stint internship platform.
//!
//! The engine in `stint-engine` talks to exactly one abstraction — the
//! [`RemoteGateway`] trait — covering the auth provider (sessions, sign-in,
//! sign-up, sign-out, session-change events) and collection-scoped CRUD
//! against the durable store. Rows cross this boundary as raw JSON; typing
//! them is the engine's entity mapper's job.
//!
//! # Example
//!
//! ```rust,no_run
//! use stint_gateway::{Filter, GatewayConfig, HttpGateway, RemoteGateway};
//!
//! # async fn example() -> Result<(), stint_gateway::GatewayError> {
//! let gateway = HttpGateway::new(GatewayConfig {
//!     base_url: "https://project.example.co".into(),
//!     api_key: "anon-key".into(),
//!     ..Default::default()
//! });
//!
//! let session = gateway.sign_in_with_password("maya@example.edu", "secret").await?;
//! let profile = gateway.find("users", &Filter::by_id(&session.identity.auth_id)).await?;
//! # let _ = profile;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod types;

pub use error::{GatewayError, Result, UNIQUE_VIOLATION_CODE};
pub use gateway::RemoteGateway;
pub use http::{GatewayConfig, HttpGateway};
pub use memory::MemoryGateway;
pub use types::{Filter, Identity, Session, SessionEvent, SignUpResult};
