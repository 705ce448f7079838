//! Attendance exceptions (`attendance_exceptions` collection): days a
//! student is excused from logging hours.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{raw, Collection};
use crate::mirror::{MirrorCollection, MirrorEntity, MirrorStore};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceKind {
    #[default]
    Excused,
    Holiday,
}

impl AttendanceKind {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "HOLIDAY" => AttendanceKind::Holiday,
            _ => AttendanceKind::Excused,
        }
    }

    pub const fn as_wire(self) -> &'static str {
        match self {
            AttendanceKind::Excused => "EXCUSED",
            AttendanceKind::Holiday => "HOLIDAY",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceException {
    pub id: String,
    pub student_id: String,
    pub date: Option<NaiveDate>,
    pub reason: String,
    pub kind: AttendanceKind,
}

impl MirrorEntity for AttendanceException {
    const COLLECTION: Collection = Collection::AttendanceExceptions;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        AttendanceException {
            id: raw::string(record, "id"),
            student_id: raw::string(record, "student_id"),
            date: raw::opt_date(record, "date"),
            reason: raw::string(record, "reason"),
            kind: AttendanceKind::from_wire(&raw::string(record, "type")),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.attendance_exceptions
    }
}
