//! Profile entity: one row per account in the `users` collection.
//!
//! `Profile.id` carries the auth id of the linked identity once the
//! resolver has run; the mapper itself makes no such guarantee.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{AVATAR_SERVICE_URL, DEFAULT_HOURS_REQUIRED};
use crate::entities::{raw, Collection};
use crate::mirror::{MirrorCollection, MirrorEntity, MirrorStore};

/// Account role, controls which operations a session may perform.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Student,
    Supervisor,
    Admin,
}

impl Role {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "SUPERVISOR" => Role::Supervisor,
            "ADMIN" => Role::Admin,
            _ => Role::Student,
        }
    }

    pub const fn as_wire(self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Supervisor => "SUPERVISOR",
            Role::Admin => "ADMIN",
        }
    }
}

/// Account standing. PENDING and REJECTED accounts never reach an
/// authenticated session.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Active,
    Pending,
    Rejected,
}

impl UserStatus {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "PENDING" => UserStatus::Pending,
            "REJECTED" => UserStatus::Rejected,
            _ => UserStatus::Active,
        }
    }

    pub const fn as_wire(self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Pending => "PENDING",
            UserStatus::Rejected => "REJECTED",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub avatar: String,
    pub total_hours_required: u32,
    pub assigned_supervisor_id: Option<String>,
    pub internship_start_date: Option<NaiveDate>,
    pub internship_end_date: Option<NaiveDate>,
    pub institution: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub hobbies: Vec<String>,
    pub profile_skills: Vec<String>,
    pub achievements: Vec<String>,
    pub future_goals: Vec<String>,
    pub supervisor_notes: String,
}

impl MirrorEntity for Profile {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        let name = raw::string_or(record, "name", "Unknown User");
        let avatar = raw::opt_string(record, "avatar")
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| {
                // The generated fallback uses the raw name, not the
                // "Unknown User" placeholder.
                default_avatar(record.get("name").and_then(Value::as_str).unwrap_or(""))
            });
        Profile {
            id: raw::string(record, "id"),
            name,
            email: raw::string(record, "email"),
            role: Role::from_wire(&raw::string(record, "role")),
            status: UserStatus::from_wire(&raw::string(record, "status")),
            avatar,
            total_hours_required: raw::uint_or(
                record,
                "total_hours_required",
                DEFAULT_HOURS_REQUIRED,
            ),
            assigned_supervisor_id: raw::opt_string(record, "assigned_supervisor_id"),
            internship_start_date: raw::opt_date(record, "internship_start_date"),
            internship_end_date: raw::opt_date(record, "internship_end_date"),
            institution: raw::opt_string(record, "institution"),
            department: raw::opt_string(record, "department"),
            bio: raw::opt_string(record, "bio"),
            phone: raw::opt_string(record, "phone"),
            hobbies: raw::string_list(record, "hobbies"),
            profile_skills: raw::string_list(record, "profile_skills"),
            achievements: raw::string_list(record, "achievements"),
            future_goals: raw::string_list(record, "future_goals"),
            supervisor_notes: raw::string(record, "supervisor_notes"),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.users
    }
}

/// Generated-avatar URL used when a profile row carries no avatar.
pub fn default_avatar(name: &str) -> String {
    let name = if name.is_empty() { "User" } else { name };
    format!(
        "{AVATAR_SERVICE_URL}?name={}&background=random",
        urlencoding::encode(name)
    )
}

/// Self-service sign-up input.
#[derive(Clone, Debug)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
    pub institution: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub profile_skills: Vec<String>,
    pub hobbies: Vec<String>,
}

/// Admin-created account input. Such accounts start ACTIVE and get a
/// client-minted id because no identity exists to borrow one from.
#[derive(Clone, Debug, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub total_hours_required: Option<u32>,
    pub assigned_supervisor_id: Option<String>,
    pub internship_start_date: Option<NaiveDate>,
    pub internship_end_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub institution: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub hobbies: Vec<String>,
    pub profile_skills: Vec<String>,
    pub achievements: Vec<String>,
    pub future_goals: Vec<String>,
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_record_maps_every_field() {
        let record = json!({
            "id": "auth-1",
            "name": "Amina Diallo",
            "email": "amina@example.edu",
            "role": "SUPERVISOR",
            "status": "PENDING",
            "avatar": "https://cdn.example.com/a.png",
            "total_hours_required": 200,
            "assigned_supervisor_id": "sup-9",
            "internship_start_date": "2026-01-05",
            "internship_end_date": "2026-06-26",
            "institution": "State Polytechnic",
            "hobbies": ["chess"],
            "profile_skills": ["sql", "rust"],
            "supervisor_notes": "strong start"
        });
        let profile = Profile::from_record(&record);
        assert_eq!(profile.id, "auth-1");
        assert_eq!(profile.role, Role::Supervisor);
        assert_eq!(profile.status, UserStatus::Pending);
        assert_eq!(profile.avatar, "https://cdn.example.com/a.png");
        assert_eq!(profile.total_hours_required, 200);
        assert_eq!(
            profile.internship_start_date,
            NaiveDate::from_ymd_opt(2026, 1, 5)
        );
        assert_eq!(profile.profile_skills, vec!["sql", "rust"]);
        assert_eq!(profile.department, None);
        assert_eq!(profile.supervisor_notes, "strong start");
    }

    #[test]
    fn test_empty_record_takes_documented_defaults() {
        let profile = Profile::from_record(&json!({}));
        assert_eq!(profile.name, "Unknown User");
        assert_eq!(profile.role, Role::Student);
        assert_eq!(profile.status, UserStatus::Active);
        assert_eq!(profile.total_hours_required, 120);
        assert!(profile.hobbies.is_empty());
        assert_eq!(profile.supervisor_notes, "");
        assert!(profile.avatar.contains("name=User"));
    }

    #[test]
    fn test_missing_avatar_falls_back_to_generated_url() {
        let profile = Profile::from_record(&json!({ "name": "Joy Okafor", "avatar": "" }));
        assert!(profile.avatar.starts_with(AVATAR_SERVICE_URL));
        assert!(profile.avatar.contains("Joy%20Okafor"));
    }

    #[test]
    fn test_unknown_enum_values_fall_back() {
        assert_eq!(Role::from_wire("INTERN"), Role::Student);
        assert_eq!(UserStatus::from_wire("unknown"), UserStatus::Active);
        assert_eq!(Role::Admin.as_wire(), "ADMIN");
    }
}
