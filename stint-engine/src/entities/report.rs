//! Periodic progress reports (`reports` collection).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{raw, Collection};
use crate::mirror::{MirrorCollection, MirrorEntity, MirrorStore};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportKind {
    #[default]
    Weekly,
    Monthly,
    Final,
}

impl ReportKind {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "MONTHLY" => ReportKind::Monthly,
            "FINAL" => ReportKind::Final,
            _ => ReportKind::Weekly,
        }
    }

    pub const fn as_wire(self) -> &'static str {
        match self {
            ReportKind::Weekly => "WEEKLY",
            ReportKind::Monthly => "MONTHLY",
            ReportKind::Final => "FINAL",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub student_id: String,
    pub kind: ReportKind,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub summary: String,
    pub key_learnings: String,
    pub next_steps: String,
    pub submitted_at: DateTime<Utc>,
}

impl MirrorEntity for Report {
    const COLLECTION: Collection = Collection::Reports;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        Report {
            id: raw::string(record, "id"),
            student_id: raw::string(record, "student_id"),
            kind: ReportKind::from_wire(&raw::string(record, "type")),
            period_start: raw::opt_date(record, "period_start"),
            period_end: raw::opt_date(record, "period_end"),
            summary: raw::string(record, "summary"),
            key_learnings: raw::string(record, "key_learnings"),
            next_steps: raw::string(record, "next_steps"),
            submitted_at: raw::timestamp_or_now(record, "submitted_at"),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.reports
    }
}
