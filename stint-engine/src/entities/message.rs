//! Chat messages (`messages` collection). Conversations are keyed by the
//! student they concern, so a supervisor/student pair shares a thread.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{raw, Collection};
use crate::mirror::{MirrorCollection, MirrorEntity, MirrorStore};

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub channel: String,
    pub related_student_id: String,
}

impl MirrorEntity for Message {
    const COLLECTION: Collection = Collection::Messages;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        Message {
            id: raw::string(record, "id"),
            sender_id: raw::string(record, "sender_id"),
            content: raw::string(record, "content"),
            timestamp: raw::timestamp_or_now(record, "timestamp"),
            channel: raw::string_or(record, "channel", "DIRECT"),
            related_student_id: raw::string(record, "related_student_id"),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.messages
    }
}
