//! The session controller: the engine's front door.
//!
//! Owns the gateway, the mirror and the mutation applier. All state
//! transitions flow through here: passive restore at startup, explicit
//! sign-in/sign-up/sign-out, and provider-initiated session events
//! consumed on a background worker. Establishment is guarded by a
//! session epoch so an establishment that was in flight when a sign-out
//! landed can never resurrect cleared state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use stint_gateway::{Filter, GatewayError, RemoteGateway, SessionEvent};

use crate::catalog;
use crate::config::{EngineConfig, DEFAULT_HOURS_REQUIRED};
use crate::entities::{
    default_avatar, AttendanceException, Badge, Collection, Evaluation, Goal, LeaveRequest,
    LogEntry, Meeting, Message, Notification, Profile, Registration, Report, Resource, Role,
    SiteVisit, Skill, SkillAssessment, Task, UserBadge, UserStatus,
};
use crate::error::{EngineError, Result};
use crate::mirror::{MirrorEntity, MirrorStore};
use crate::mutation::Mutations;

use super::recovery::PasswordRecovery;
use super::resolver;
use super::AUTH_MANAGED_PASSWORD;

/// What a completed registration means for the caller.
#[derive(Debug, Clone)]
pub enum RegistrationOutcome {
    /// Profile created and session established immediately.
    SignedIn(Profile),
    /// Supervisor account created; an admin must approve it before the
    /// first sign-in.
    AwaitingApproval,
    /// Identity created without a session (the provider wants email
    /// confirmation first); sign in once it allows.
    ReadyToSignIn,
}

/// Session lifecycle controller over one gateway.
pub struct SessionController {
    gateway: Arc<dyn RemoteGateway>,
    mirror: Arc<MirrorStore>,
    mutations: Mutations,
    recovery: PasswordRecovery,
    current_profile_id: Mutex<Option<String>>,
    /// Bumped on every teardown. Establishments capture the value at
    /// entry and drop their commit when it has moved.
    epoch: AtomicU64,
    events_task: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
}

impl SessionController {
    pub fn new(gateway: Arc<dyn RemoteGateway>, config: EngineConfig) -> Arc<Self> {
        let mirror = Arc::new(MirrorStore::new());
        let mutations = Mutations::new(Arc::clone(&gateway), Arc::clone(&mirror));
        let recovery = PasswordRecovery::new(config.reset_webhook_url);
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(SessionController {
            gateway,
            mirror,
            mutations,
            recovery,
            current_profile_id: Mutex::new(None),
            epoch: AtomicU64::new(0),
            events_task: Mutex::new(None),
            shutdown_tx,
        })
    }

    // === Event worker ===

    /// Spawn the session-event worker.
    ///
    /// Takes the gateway's single-consumer event receiver; when another
    /// consumer already holds it this is a no-op. Events are applied
    /// strictly in arrival order.
    pub fn start(self: Arc<Self>) {
        let Some(mut events) = self.gateway.subscribe_session_events() else {
            debug!("session event receiver already taken");
            return;
        };
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let controller = Arc::clone(&self);
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    event = events.recv() => match event {
                        Some(event) => controller.apply_event(event).await,
                        None => break,
                    },
                }
            }
        });
        *self.events_task.lock().unwrap() = Some(task);
    }

    /// Stop the event worker.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let task = self.events_task.lock().unwrap().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    async fn apply_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::SignedIn(session) => {
                let epoch = self.epoch.load(Ordering::SeqCst);
                debug!(auth_id = %session.identity.auth_id, "session event: signed in");
                match resolver::resolve_profile(self.gateway.as_ref(), &session.identity).await {
                    Ok(profile) => {
                        self.establish(profile, epoch).await;
                    }
                    Err(EngineError::Gateway(error)) => {
                        // Transient: the next restore may still succeed.
                        warn!(%error, "session event resolution failed");
                    }
                    Err(error) => {
                        info!(%error, "unresolvable sign-in, revoking the session");
                        self.logout().await;
                    }
                }
            }
            SessionEvent::SignedOut => {
                debug!("session event: signed out");
                self.teardown_local();
            }
        }
    }

    // === Lifecycle operations ===

    /// Restore a persisted session, if the provider holds one.
    ///
    /// Passive: an absent session and transport failures both leave the
    /// engine signed out without surfacing an error. Account-state
    /// refusals (pending supervisor, rejected registration) revoke the
    /// restored session and do surface, so the caller can say why.
    pub async fn bootstrap(&self) -> Result<()> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let session = match self.gateway.get_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!("no persisted session");
                return Ok(());
            }
            Err(error) => {
                warn!(%error, "session restore failed");
                return Ok(());
            }
        };

        match resolver::resolve_profile(self.gateway.as_ref(), &session.identity).await {
            Ok(profile) => {
                self.establish(profile, epoch).await;
                Ok(())
            }
            Err(EngineError::Gateway(error)) => {
                // Transient backend trouble must not destroy a session
                // that may resolve fine on the next start.
                warn!(%error, "bootstrap resolution failed, staying signed out");
                Ok(())
            }
            Err(error) => {
                self.logout().await;
                Err(error)
            }
        }
    }

    /// Authenticate with email and password and establish the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let session = self
            .gateway
            .sign_in_with_password(email, password)
            .await
            .map_err(credentials_error)?;

        match resolver::resolve_profile(self.gateway.as_ref(), &session.identity).await {
            Ok(profile) => {
                self.establish(profile.clone(), epoch).await;
                Ok(profile)
            }
            Err(error) => {
                // A token without a usable profile must not linger.
                self.logout().await;
                Err(error)
            }
        }
    }

    /// Register a new account.
    ///
    /// Creates the identity with the provider, then the profile row.
    /// Supervisors start PENDING and are never auto-established;
    /// students sign straight in when the provider grants a session.
    pub async fn register(&self, registration: Registration) -> Result<RegistrationOutcome> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let signup = self
            .gateway
            .sign_up(&registration.email, &registration.password)
            .await
            .map_err(credentials_error)?;

        self.insert_registration_profile(&registration, &signup.identity.auth_id)
            .await?;

        if registration.role == Role::Supervisor {
            // Approval gate: the account exists but must not become a
            // session until an admin flips PENDING to ACTIVE.
            self.logout().await;
            return Ok(RegistrationOutcome::AwaitingApproval);
        }

        match signup.session {
            Some(session) => {
                match resolver::resolve_profile(self.gateway.as_ref(), &session.identity).await {
                    Ok(profile) => {
                        self.establish(profile.clone(), epoch).await;
                        Ok(RegistrationOutcome::SignedIn(profile))
                    }
                    Err(error) => {
                        self.logout().await;
                        Err(error)
                    }
                }
            }
            None => Ok(RegistrationOutcome::ReadyToSignIn),
        }
    }

    async fn insert_registration_profile(
        &self,
        registration: &Registration,
        auth_id: &str,
    ) -> Result<()> {
        let status = if registration.role == Role::Supervisor {
            UserStatus::Pending
        } else {
            UserStatus::Active
        };
        let mut payload = json!({
            "id": auth_id,
            "name": registration.name,
            "email": registration.email,
            "password": AUTH_MANAGED_PASSWORD,
            "role": registration.role.as_wire(),
            "status": status.as_wire(),
            "avatar": default_avatar(&registration.name),
            "phone": registration.phone,
            "institution": registration.institution,
            "department": registration.department,
            "bio": registration.bio,
            "profile_skills": registration.profile_skills,
            "hobbies": registration.hobbies,
            "achievements": [],
            "future_goals": [],
        });
        // Only students carry an hour quota; the column stays absent on
        // supervisor rows.
        if registration.role == Role::Student {
            payload["total_hours_required"] = json!(DEFAULT_HOURS_REQUIRED);
        }

        match self.gateway.insert(Collection::Users.as_str(), payload).await {
            Ok(_) => Ok(()),
            Err(error) if error.is_unique_violation() => {
                // An admin-seeded row already holds this email; adopt it
                // instead of failing the registration.
                info!(email = %registration.email, "profile row exists, linking to new identity");
                self.gateway
                    .update(
                        Collection::Users.as_str(),
                        &Filter::eq("email", &registration.email),
                        json!({ "id": auth_id }),
                    )
                    .await
                    .map_err(|error| EngineError::ProfileLink(error.to_string()))?;
                Ok(())
            }
            Err(error) => Err(EngineError::ProfileCreation(error.to_string())),
        }
    }

    /// End the session.
    ///
    /// Local state is torn down first, so the caller is signed out even
    /// when the remote revocation cannot be delivered; that failure is
    /// logged and not retried.
    pub async fn logout(&self) {
        self.teardown_local();
        if let Err(error) = self.gateway.sign_out().await {
            warn!(%error, "remote sign-out failed");
        }
    }

    fn teardown_local(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *self.current_profile_id.lock().unwrap() = None;
        self.mirror.clear();
    }

    // === Establishment and hydration ===

    /// Commit a resolved profile as the current session and hydrate.
    ///
    /// Dropped (returning `false`) when the epoch moved after
    /// `entry_epoch` was read: a sign-out won the race, and the stale
    /// establishment must not resurrect state.
    async fn establish(&self, profile: Profile, entry_epoch: u64) -> bool {
        if self.epoch.load(Ordering::SeqCst) != entry_epoch {
            debug!(profile_id = %profile.id, "session epoch moved, dropping establishment");
            return false;
        }
        info!(profile_id = %profile.id, role = profile.role.as_wire(), "session established");
        self.mirror.users.commit(profile.clone());
        *self.current_profile_id.lock().unwrap() = Some(profile.id.clone());

        self.hydrate().await;

        if self.epoch.load(Ordering::SeqCst) != entry_epoch {
            debug!(profile_id = %profile.id, "sign-out raced hydration, clearing");
            *self.current_profile_id.lock().unwrap() = None;
            self.mirror.clear();
            return false;
        }
        true
    }

    /// Pull every collection into the mirror.
    ///
    /// Per-collection failures are logged and leave that collection as
    /// it was; hydration never fails the session.
    async fn hydrate(&self) {
        self.load::<Profile>().await;
        self.load::<LogEntry>().await;
        self.load::<Task>().await;
        self.load::<Report>().await;
        self.load::<Goal>().await;
        self.load::<Resource>().await;
        self.load::<Evaluation>().await;
        self.load::<Message>().await;
        self.load::<Meeting>().await;
        self.load::<Notification>().await;
        self.load::<Skill>().await;
        self.load::<SkillAssessment>().await;
        self.load::<Badge>().await;
        self.load::<UserBadge>().await;
        self.load::<LeaveRequest>().await;
        self.load::<SiteVisit>().await;
        self.load::<AttendanceException>().await;

        // A fresh backend may not have the reference catalogs
        // provisioned yet; seed them locally so rules and rendering
        // have rows to point at.
        if self.mirror.badges.is_empty() {
            for badge in catalog::builtin_badges() {
                self.mirror.badges.commit(badge);
            }
        }
        if self.mirror.skills.is_empty() {
            for skill in catalog::builtin_skills() {
                self.mirror.skills.commit(skill);
            }
        }
    }

    async fn load<T: MirrorEntity>(&self) {
        match self.gateway.list_all(T::COLLECTION.as_str()).await {
            Ok(rows) => {
                let entities = rows.iter().map(T::from_record).collect();
                T::slot(&self.mirror).replace_all(entities);
            }
            Err(error) => {
                warn!(collection = %T::COLLECTION, %error, "hydration fetch failed");
            }
        }
    }

    // === Account recovery ===

    /// Start a password-reset flow for `email`.
    pub async fn begin_password_reset(&self, email: &str) -> Result<()> {
        self.recovery.begin(self.gateway.as_ref(), email).await
    }

    /// Check a reset code previously issued for `email`.
    pub fn verify_reset_code(&self, email: &str, code: &str) -> Result<()> {
        self.recovery.verify(email, code)
    }

    // === Accessors ===

    /// The signed-in profile, read through the mirror.
    pub fn current_user(&self) -> Option<Profile> {
        let id = self.current_profile_id.lock().unwrap().clone();
        self.mirror.users.get(&id?)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_profile_id.lock().unwrap().is_some()
    }

    /// The signed-in profile, or an error.
    ///
    /// A session pointing at a profile the mirror no longer holds is
    /// unrecoverable; it is torn down here before the error returns.
    pub async fn require_current_user(&self) -> Result<Profile> {
        let id = self.current_profile_id.lock().unwrap().clone();
        let Some(id) = id else {
            return Err(EngineError::NotAuthenticated);
        };
        match self.mirror.users.get(&id) {
            Some(profile) => Ok(profile),
            None => {
                warn!(profile_id = %id, "authenticated without profile, forcing sign-out");
                self.logout().await;
                Err(EngineError::AccountState(
                    "session referenced a missing profile".to_string(),
                ))
            }
        }
    }

    pub fn mirror(&self) -> &MirrorStore {
        &self.mirror
    }

    pub fn mutations(&self) -> &Mutations {
        &self.mutations
    }
}

/// Auth-provider refusals carry the provider's own message; everything
/// else stays a gateway error.
fn credentials_error(error: GatewayError) -> EngineError {
    match error {
        GatewayError::Auth(message) => EngineError::Credentials(message),
        other => EngineError::Gateway(other),
    }
}
