//! Daily work-log entries (`logs` collection).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{raw, Collection};
use crate::mirror::{MirrorCollection, MirrorEntity, MirrorStore};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LogStatus {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "APPROVED" => LogStatus::Approved,
            "REJECTED" => LogStatus::Rejected,
            _ => LogStatus::Pending,
        }
    }

    pub const fn as_wire(self) -> &'static str {
        match self {
            LogStatus::Pending => "PENDING",
            LogStatus::Approved => "APPROVED",
            LogStatus::Rejected => "REJECTED",
        }
    }
}

/// One logged work day. `date` is the calendar day the hours were worked,
/// which is what the streak rule counts.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub student_id: String,
    pub date: NaiveDate,
    pub hours_worked: f64,
    pub activity_description: String,
    pub challenges: Option<String>,
    pub status: LogStatus,
    pub supervisor_comment: Option<String>,
}

impl MirrorEntity for LogEntry {
    const COLLECTION: Collection = Collection::Logs;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        LogEntry {
            id: raw::string(record, "id"),
            student_id: raw::string(record, "student_id"),
            date: raw::date_or_today(record, "date"),
            hours_worked: raw::float_or(record, "hours_worked", 0.0),
            activity_description: raw::string(record, "activity_description"),
            challenges: raw::opt_string(record, "challenges"),
            status: LogStatus::from_wire(&raw::string(record, "status")),
            supervisor_comment: raw::opt_string(record, "supervisor_comment"),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.logs
    }
}
