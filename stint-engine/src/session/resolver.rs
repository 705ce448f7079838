//! Identity resolution: from a provider identity to an application profile.
//!
//! Auth accounts and profile rows share an id but can drift apart: an
//! admin seeds a profile before the person ever signs in, or a past
//! registration half-completed. Resolution repairs the drift instead of
//! failing the sign-in. The sequence is lookup by auth id, then lookup
//! by email with an id-rewriting link, then creation of a minimal
//! recovery profile; a uniqueness conflict during that creation means a
//! concurrent path won the race, so the link is retried once. Whatever
//! profile comes out is gated on account status before it may become a
//! session.

use serde_json::json;
use tracing::{debug, info, warn};

use stint_gateway::{Filter, Identity, RemoteGateway};

use crate::config::DEFAULT_HOURS_REQUIRED;
use crate::entities::{default_avatar, Collection, Profile, Role, UserStatus};
use crate::error::{EngineError, Result};
use crate::mirror::MirrorEntity;

use super::AUTH_MANAGED_PASSWORD;

/// Resolve `identity` to its profile, creating or relinking one if the
/// rows have drifted. Errors carry the user-facing reason; the caller
/// decides whether the provider session must also be revoked.
pub(crate) async fn resolve_profile(
    gateway: &dyn RemoteGateway,
    identity: &Identity,
) -> Result<Profile> {
    let users = Collection::Users.as_str();

    if let Some(record) = gateway
        .find(users, &Filter::by_id(&identity.auth_id))
        .await?
    {
        return gate(Profile::from_record(&record));
    }
    debug!(auth_id = %identity.auth_id, "no profile under auth id, trying email link");

    if let Some(profile) = link_by_email(gateway, identity).await? {
        return gate(profile);
    }

    info!(email = %identity.email, "no profile found, creating recovery profile");
    let profile = create_recovery_profile(gateway, identity).await?;
    gate(profile)
}

/// Find a profile row by email and rewrite its id to the identity's
/// auth id, adopting it for this account. `Ok(None)` when no row holds
/// the address; a lookup failure is treated the same, since the create
/// path self-corrects through its conflict retry.
async fn link_by_email(
    gateway: &dyn RemoteGateway,
    identity: &Identity,
) -> Result<Option<Profile>> {
    let users = Collection::Users.as_str();
    let by_email = Filter::eq("email", &identity.email);

    let existing = match gateway.find(users, &by_email).await {
        Ok(row) => row,
        Err(error) => {
            debug!(%error, "email lookup failed, treating as absent");
            None
        }
    };
    if existing.is_none() {
        return Ok(None);
    }

    let linked = gateway
        .update(users, &by_email, json!({ "id": identity.auth_id }))
        .await
        .map_err(|error| EngineError::ProfileLink(error.to_string()))?;
    info!(auth_id = %identity.auth_id, "relinked existing profile to auth id");
    Ok(Some(Profile::from_record(&linked)))
}

/// Insert a minimal STUDENT/ACTIVE profile for an identity that has
/// none. Name falls back to the email's local part, avatar and hour
/// quota to their defaults; everything else starts empty.
async fn create_recovery_profile(
    gateway: &dyn RemoteGateway,
    identity: &Identity,
) -> Result<Profile> {
    let name = match identity.email_local_part() {
        "" => "User",
        local => local,
    };
    let payload = json!({
        "id": identity.auth_id,
        "email": identity.email,
        "name": name,
        "role": Role::Student.as_wire(),
        "status": UserStatus::Active.as_wire(),
        "password": AUTH_MANAGED_PASSWORD,
        "avatar": default_avatar(name),
        "total_hours_required": DEFAULT_HOURS_REQUIRED,
        "profile_skills": [],
        "hobbies": [],
        "achievements": [],
        "future_goals": [],
    });

    match gateway.insert(Collection::Users.as_str(), payload).await {
        Ok(record) => Ok(Profile::from_record(&record)),
        Err(create_error) if create_error.is_unique_violation() => {
            // Lost a race: the row appeared between lookup and insert,
            // so the link path applies after all.
            warn!(%create_error, "recovery insert conflicted, retrying email link");
            match link_by_email(gateway, identity).await {
                Ok(Some(profile)) => Ok(profile),
                Ok(None) | Err(_) => {
                    Err(EngineError::ProfileCreation(create_error.to_string()))
                }
            }
        }
        Err(create_error) => Err(EngineError::ProfileCreation(create_error.to_string())),
    }
}

/// Status gate: profiles that exist but must not become a session.
fn gate(profile: Profile) -> Result<Profile> {
    if profile.role == Role::Supervisor && profile.status == UserStatus::Pending {
        return Err(EngineError::PendingApproval);
    }
    if profile.status == UserStatus::Rejected {
        return Err(EngineError::RegistrationRejected);
    }
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stint_gateway::MemoryGateway;

    fn identity(auth_id: &str, email: &str) -> Identity {
        Identity::new(auth_id, email)
    }

    #[tokio::test]
    async fn test_resolves_directly_by_auth_id() {
        let gateway = MemoryGateway::new();
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

        let profile = resolve_profile(&gateway, &identity("auth-1", "amina@example.edu"))
            .await
            .unwrap();
        assert_eq!(profile.id, "auth-1");
        assert_eq!(profile.name, "Amina Diallo");
        assert_eq!(gateway.row_count("users"), 1);
    }

    #[tokio::test]
    async fn test_links_seeded_profile_by_email_and_rewrites_id() {
        let gateway = MemoryGateway::new();
        gateway.seed(
            "users",
            json!({
                "id": "seeded-7",
                "name": "Jonas Petit",
                "email": "jonas@example.edu",
                "role": "STUDENT",
                "status": "ACTIVE",
            }),
        );

        let profile = resolve_profile(&gateway, &identity("auth-9", "jonas@example.edu"))
            .await
            .unwrap();

        assert_eq!(profile.id, "auth-9");
        assert_eq!(profile.name, "Jonas Petit");
        assert!(gateway
            .find("users", &Filter::by_id("auth-9"))
            .await
            .unwrap()
            .is_some());
        assert!(gateway
            .find("users", &Filter::by_id("seeded-7"))
            .await
            .unwrap()
            .is_none());
        assert_eq!(gateway.row_count("users"), 1);
    }

    #[tokio::test]
    async fn test_creates_recovery_profile_when_nothing_matches() {
        let gateway = MemoryGateway::new();

        let profile = resolve_profile(&gateway, &identity("auth-3", "lena.m@example.edu"))
            .await
            .unwrap();

        assert_eq!(profile.id, "auth-3");
        assert_eq!(profile.name, "lena.m");
        assert_eq!(profile.role, Role::Student);
        assert_eq!(profile.status, UserStatus::Active);
        assert_eq!(profile.total_hours_required, DEFAULT_HOURS_REQUIRED);

        let row = gateway
            .find("users", &Filter::by_id("auth-3"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["email"], "lena.m@example.edu");
    }

    #[tokio::test]
    async fn test_recovery_name_falls_back_for_empty_local_part() {
        let gateway = MemoryGateway::new();

        let profile = resolve_profile(&gateway, &identity("auth-4", "@example.edu"))
            .await
            .unwrap();
        assert_eq!(profile.name, "User");
    }

    #[tokio::test]
    async fn test_pending_supervisor_is_gated() {
        let gateway = MemoryGateway::new();
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

        let err = resolve_profile(&gateway, &identity("auth-5", "sup@example.edu"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::PendingApproval));
    }

    #[tokio::test]
    async fn test_rejected_account_is_gated_regardless_of_role() {
        let gateway = MemoryGateway::new();
        gateway.seed(
            "users",
            json!({
                "id": "auth-6",
                "name": "Rejected Person",
                "email": "rej@example.edu",
                "role": "STUDENT",
                "status": "REJECTED",
            }),
        );

        let err = resolve_profile(&gateway, &identity("auth-6", "rej@example.edu"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::RegistrationRejected));
    }

    #[tokio::test]
    async fn test_pending_supervisor_is_gated_even_through_the_link_path() {
        let gateway = MemoryGateway::new();
        gateway.seed(
            "users",
            json!({
                "id": "seeded-1",
                "name": "Sup Pending",
                "email": "sup2@example.edu",
                "role": "SUPERVISOR",
                "status": "PENDING",
            }),
        );

        let err = resolve_profile(&gateway, &identity("auth-7", "sup2@example.edu"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::PendingApproval));
        // The link itself still happened; only the session is refused.
        assert!(gateway
            .find("users", &Filter::by_id("auth-7"))
            .await
            .unwrap()
            .is_some());
    }
}
