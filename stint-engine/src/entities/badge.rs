//! Badge catalog (`badges`) and earned badges (`user_badges`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{raw, Collection};
use crate::mirror::{MirrorCollection, MirrorEntity, MirrorStore};

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub points: u32,
}

impl MirrorEntity for Badge {
    const COLLECTION: Collection = Collection::Badges;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        Badge {
            id: raw::string(record, "id"),
            name: raw::string(record, "name"),
            description: raw::string(record, "description"),
            icon: raw::string_or(record, "icon", "Star"),
            color: raw::string_or(record, "color", "bg-gray-100"),
            points: raw::uint_or(record, "points", 0),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.badges
    }
}

/// A badge grant: links an account to a catalog badge.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserBadge {
    pub id: String,
    pub user_id: String,
    pub badge_id: String,
    pub earned_at: DateTime<Utc>,
}

impl MirrorEntity for UserBadge {
    const COLLECTION: Collection = Collection::UserBadges;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        UserBadge {
            id: raw::string(record, "id"),
            user_id: raw::string(record, "user_id"),
            badge_id: raw::string(record, "badge_id"),
            earned_at: raw::timestamp_or_now(record, "earned_at"),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.user_badges
    }
}
