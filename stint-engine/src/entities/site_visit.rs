//! Supervisor site visits (`site_visits` collection).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{raw, Collection};
use crate::mirror::{MirrorCollection, MirrorEntity, MirrorStore};

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SiteVisit {
    pub id: String,
    pub student_id: String,
    pub visitor_id: String,
    pub date: Option<NaiveDate>,
    pub location: String,
    pub purpose: String,
    pub notes: String,
}

impl MirrorEntity for SiteVisit {
    const COLLECTION: Collection = Collection::SiteVisits;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        SiteVisit {
            id: raw::string(record, "id"),
            student_id: raw::string(record, "student_id"),
            visitor_id: raw::string(record, "visitor_id"),
            date: raw::opt_date(record, "date"),
            location: raw::string(record, "location"),
            purpose: raw::string(record, "purpose"),
            notes: raw::string(record, "notes"),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.site_visits
    }
}
