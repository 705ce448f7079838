//! Session lifecycle integration tests
//!
//! Drives the controller against a full in-memory backend:
//! - event-worker establishment from provider-side sign-ins
//! - provider-initiated sign-out clearing local state
//! - sign-out racing hydration (the late establishment must drop)
//! - identity-conflict repair (lookup miss plus insert conflict
//!   resolved by a single linking retry)
//! - account gates surfacing through bootstrap
//! - password-reset codes delivered through the webhook

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stint_engine::{EngineConfig, EngineError, SessionController};
use stint_gateway::{
    Filter, Identity, MemoryGateway, RemoteGateway, Result as GatewayResult, Session,
    SessionEvent, SignUpResult,
};

async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {}", what);
}

fn seeded_gateway() -> Arc<MemoryGateway> {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.register_identity("amina@example.edu", "pw", "auth-1");
    gateway.seed(
        "users",
        json!({
            "id": "auth-1",
            "name": "Amina Diallo",
            "email": "amina@example.edu",
            "role": "STUDENT",
            "status": "ACTIVE",
        }),
    );
    gateway
}

// =============================================================================
// Event worker
// =============================================================================

#[tokio::test]
async fn test_event_worker_establishes_provider_side_sign_in() {
    let gateway = seeded_gateway();
    let controller = SessionController::new(
        Arc::clone(&gateway) as Arc<dyn RemoteGateway>,
        EngineConfig::new(),
    );
    controller.clone().start();

    // Sign in at the provider directly, not through the controller.
    gateway
        .sign_in_with_password("amina@example.edu", "pw")
        .await
        .unwrap();

    wait_until("event-driven establishment", || {
        controller.is_authenticated()
    })
    .await;
    assert_eq!(controller.current_user().unwrap().id, "auth-1");

    controller.shutdown().await;
}

#[tokio::test]
async fn test_event_worker_revokes_gated_sign_in() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.register_identity("sup@example.edu", "pw", "auth-5");
    gateway.seed(
        "users",
        json!({
            "id": "auth-5",
            "name": "Sup Pending",
            "email": "sup@example.edu",
            "role": "SUPERVISOR",
            "status": "PENDING",
        }),
    );
    let controller = SessionController::new(
        Arc::clone(&gateway) as Arc<dyn RemoteGateway>,
        EngineConfig::new(),
    );
    controller.clone().start();

    // The provider grants a session; the gate must take it back.
    gateway
        .sign_in_with_password("sup@example.edu", "pw")
        .await
        .unwrap();

    let mut revoked = false;
    for _ in 0..400 {
        if gateway.get_session().await.unwrap().is_none() {
            revoked = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(revoked, "gated session was never revoked");
    assert!(!controller.is_authenticated());

    controller.shutdown().await;
}

#[tokio::test]
async fn test_provider_sign_out_clears_local_state() {
    let gateway = seeded_gateway();
    gateway.seed(
        "logs",
        json!({"id": "log-1", "student_id": "auth-1", "hours_worked": 4.0}),
    );
    let controller = SessionController::new(
        Arc::clone(&gateway) as Arc<dyn RemoteGateway>,
        EngineConfig::new(),
    );
    controller.clone().start();

    controller.login("amina@example.edu", "pw").await.unwrap();
    assert_eq!(controller.mirror().logs.len(), 1);

    // The provider ends the session; the worker must tear down.
    gateway.sign_out().await.unwrap();

    wait_until("event-driven teardown", || !controller.is_authenticated()).await;
    assert!(controller.current_user().is_none());
    assert!(controller.mirror().logs.is_empty());

    controller.shutdown().await;
}

// =============================================================================
// Races: sign-out vs in-flight establishment
// =============================================================================

/// A `MemoryGateway` wrapper with hooks the stock fault switches cannot
/// express: suppressing email lookups (stages resolution races) and
/// stalling a hydration fetch (stages sign-out races).
struct InstrumentedGateway {
    inner: MemoryGateway,
    suppress_email_finds: AtomicU32,
    stall_next_list: AtomicBool,
    list_entered: UnboundedSender<()>,
    release: Notify,
}

impl InstrumentedGateway {
    fn new(inner: MemoryGateway) -> (Arc<Self>, UnboundedReceiver<()>) {
        let (list_entered, entered_rx) = mpsc::unbounded_channel();
        let gateway = Arc::new(InstrumentedGateway {
            inner,
            suppress_email_finds: AtomicU32::new(0),
            stall_next_list: AtomicBool::new(false),
            list_entered,
            release: Notify::new(),
        });
        (gateway, entered_rx)
    }
}

#[async_trait]
impl RemoteGateway for InstrumentedGateway {
    async fn get_session(&self) -> GatewayResult<Option<Session>> {
        self.inner.get_session().await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> GatewayResult<Session> {
        self.inner.sign_in_with_password(email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> GatewayResult<SignUpResult> {
        self.inner.sign_up(email, password).await
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        self.inner.sign_out().await
    }

    fn subscribe_session_events(&self) -> Option<UnboundedReceiver<SessionEvent>> {
        self.inner.subscribe_session_events()
    }

    async fn find(&self, collection: &str, filter: &Filter) -> GatewayResult<Option<Value>> {
        let targets_email = filter.clauses().iter().any(|(field, _)| field == "email");
        if targets_email && self.suppress_email_finds.load(Ordering::SeqCst) > 0 {
            self.suppress_email_finds.fetch_sub(1, Ordering::SeqCst);
            return Ok(None);
        }
        self.inner.find(collection, filter).await
    }

    async fn insert(&self, collection: &str, payload: Value) -> GatewayResult<Value> {
        self.inner.insert(collection, payload).await
    }

    async fn update(&self, collection: &str, filter: &Filter, patch: Value) -> GatewayResult<Value> {
        self.inner.update(collection, filter, patch).await
    }

    async fn delete(&self, collection: &str, id: &str) -> GatewayResult<()> {
        self.inner.delete(collection, id).await
    }

    async fn list_all(&self, collection: &str) -> GatewayResult<Vec<Value>> {
        if self.stall_next_list.swap(false, Ordering::SeqCst) {
            let _ = self.list_entered.send(());
            self.release.notified().await;
        }
        self.inner.list_all(collection).await
    }
}

#[tokio::test]
async fn test_sign_out_during_hydration_drops_the_establishment() {
    let inner = MemoryGateway::new();
    inner.register_identity("amina@example.edu", "pw", "auth-1");
    inner.seed(
        "users",
        json!({
            "id": "auth-1",
            "name": "Amina Diallo",
            "email": "amina@example.edu",
            "role": "STUDENT",
            "status": "ACTIVE",
        }),
    );
    inner.seed(
        "logs",
        json!({"id": "log-1", "student_id": "auth-1", "hours_worked": 4.0}),
    );
    let (gateway, mut entered_rx) = InstrumentedGateway::new(inner);
    let controller = SessionController::new(
        Arc::clone(&gateway) as Arc<dyn RemoteGateway>,
        EngineConfig::new(),
    );

    gateway.stall_next_list.store(true, Ordering::SeqCst);
    let login_controller = Arc::clone(&controller);
    let login = tokio::spawn(async move {
        login_controller.login("amina@example.edu", "pw").await
    });

    // Hydration entered its first fetch and is held there.
    entered_rx.recv().await.unwrap();
    controller.logout().await;
    gateway.release.notify_one();

    // The sign-in itself succeeded, but its establishment lost the race
    // and must leave nothing behind.
    login.await.unwrap().unwrap();
    assert!(!controller.is_authenticated());
    assert!(controller.current_user().is_none());
    assert!(controller.mirror().users.is_empty());
    assert!(controller.mirror().logs.is_empty());
}

#[tokio::test]
async fn test_resolution_repairs_through_linking_retry() {
    let inner = MemoryGateway::new();
    inner.register_identity("jonas@example.edu", "pw", "auth-9");
    inner.seed(
        "users",
        json!({
            "id": "stale-1",
            "name": "Jonas Petit",
            "email": "jonas@example.edu",
            "role": "STUDENT",
            "status": "ACTIVE",
        }),
    );
    let (gateway, _entered_rx) = InstrumentedGateway::new(inner);
    // The email lookup misses once, so resolution goes down the create
    // path and collides with the existing row.
    gateway.suppress_email_finds.store(1, Ordering::SeqCst);

    let controller = SessionController::new(
        Arc::clone(&gateway) as Arc<dyn RemoteGateway>,
        EngineConfig::new(),
    );
    let profile = controller.login("jonas@example.edu", "pw").await.unwrap();

    // The conflict retry adopted the existing row instead of failing.
    assert_eq!(profile.id, "auth-9");
    assert_eq!(profile.name, "Jonas Petit");
    assert_eq!(gateway.inner.row_count("users"), 1);
    assert!(controller.is_authenticated());
}

// =============================================================================
// Bootstrap gates
// =============================================================================

#[tokio::test]
async fn test_bootstrap_revokes_a_gated_restored_session() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.seed(
        "users",
        json!({
            "id": "auth-5",
            "name": "Sup Pending",
            "email": "sup@example.edu",
            "role": "SUPERVISOR",
            "status": "PENDING",
        }),
    );
    gateway.restore_session(Identity::new("auth-5", "sup@example.edu"));
    let controller = SessionController::new(
        Arc::clone(&gateway) as Arc<dyn RemoteGateway>,
        EngineConfig::new(),
    );

    let err = controller.bootstrap().await.unwrap_err();
    assert!(matches!(err, EngineError::PendingApproval));
    assert!(!controller.is_authenticated());
    assert!(gateway.get_session().await.unwrap().is_none());
}

// =============================================================================
// Password reset
// =============================================================================

#[tokio::test]
async fn test_password_reset_code_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reset"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let gateway = seeded_gateway();
    let config = EngineConfig::new().with_reset_webhook(format!("{}/reset", server.uri()));
    let controller =
        SessionController::new(Arc::clone(&gateway) as Arc<dyn RemoteGateway>, config);

    controller
        .begin_password_reset("amina@example.edu")
        .await
        .unwrap();

    // Delivery is fire-and-forget; wait for the webhook to see it.
    let mut attempts = 0;
    let body: Value = loop {
        let received = server.received_requests().await.unwrap();
        if let Some(request) = received.first() {
            break serde_json::from_slice(&request.body).unwrap();
        }
        attempts += 1;
        assert!(attempts < 400, "webhook never received the reset code");
        tokio::time::sleep(Duration::from_millis(5)).await;
    };
    assert_eq!(body["email"], "amina@example.edu");
    assert_eq!(body["name"], "Amina Diallo");
    let code = body["resetCode"].as_str().unwrap().to_string();

    assert!(matches!(
        controller.verify_reset_code("amina@example.edu", "0"),
        Err(EngineError::InvalidResetCode)
    ));
    controller
        .verify_reset_code("amina@example.edu", &code)
        .unwrap();
    // Consumed: the same code cannot be replayed.
    assert!(controller
        .verify_reset_code("amina@example.edu", &code)
        .is_err());

    let err = controller
        .begin_password_reset("ghost@example.edu")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownEmail));
}
