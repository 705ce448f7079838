//! Scheduled meetings (`meetings` collection). `time` stays a plain
//! `HH:MM` string, mirroring the stored form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{raw, Collection};
use crate::mirror::{MirrorCollection, MirrorEntity, MirrorStore};

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    pub title: String,
    pub organizer_id: String,
    pub date: Option<NaiveDate>,
    pub time: String,
    pub attendees: Vec<String>,
    pub link: Option<String>,
}

impl MirrorEntity for Meeting {
    const COLLECTION: Collection = Collection::Meetings;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        Meeting {
            id: raw::string(record, "id"),
            title: raw::string(record, "title"),
            organizer_id: raw::string(record, "organizer_id"),
            date: raw::opt_date(record, "date"),
            time: raw::string(record, "time"),
            attendees: raw::string_list(record, "attendees"),
            link: raw::opt_string(record, "link"),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.meetings
    }
}
