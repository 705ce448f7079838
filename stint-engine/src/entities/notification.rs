//! In-app notifications (`notifications` collection). A recipient id of
//! `"ALL"` addresses every account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{raw, Collection};
use crate::mirror::{MirrorCollection, MirrorEntity, MirrorStore};

/// Recipient id that targets every account.
pub const BROADCAST_RECIPIENT: &str = "ALL";

/// Sender id used for engine-generated notifications.
pub const SYSTEM_SENDER: &str = "SYSTEM";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    #[default]
    Info,
    Alert,
    Announcement,
}

impl NotificationKind {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "ALERT" => NotificationKind::Alert,
            "ANNOUNCEMENT" => NotificationKind::Announcement,
            _ => NotificationKind::Info,
        }
    }

    pub const fn as_wire(self) -> &'static str {
        match self {
            NotificationKind::Info => "INFO",
            NotificationKind::Alert => "ALERT",
            NotificationKind::Announcement => "ANNOUNCEMENT",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    pub sender_id: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    /// Whether this notification lands in the given account's feed.
    pub fn addresses(&self, profile_id: &str) -> bool {
        self.recipient_id == profile_id || self.recipient_id == BROADCAST_RECIPIENT
    }
}

impl MirrorEntity for Notification {
    const COLLECTION: Collection = Collection::Notifications;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        Notification {
            id: raw::string(record, "id"),
            recipient_id: raw::string(record, "recipient_id"),
            sender_id: raw::string(record, "sender_id"),
            title: raw::string(record, "title"),
            message: raw::string(record, "message"),
            kind: NotificationKind::from_wire(&raw::string(record, "type")),
            timestamp: raw::timestamp_or_now(record, "timestamp"),
            read: raw::bool_or(record, "read", false),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.notifications
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_broadcast_addresses_everyone() {
        let notification = Notification::from_record(&json!({
            "id": "n-1",
            "recipient_id": "ALL",
            "sender_id": "SYSTEM",
            "title": "Maintenance window"
        }));
        assert!(notification.addresses("s-1"));
        assert!(notification.addresses("sup-1"));
        assert!(!notification.read);
        assert_eq!(notification.kind, NotificationKind::Info);
    }

    #[test]
    fn test_direct_notification_addresses_only_its_recipient() {
        let notification = Notification::from_record(&json!({
            "id": "n-2",
            "recipient_id": "s-1"
        }));
        assert!(notification.addresses("s-1"));
        assert!(!notification.addresses("s-2"));
    }
}
