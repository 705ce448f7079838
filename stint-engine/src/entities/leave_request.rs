//! Leave requests (`leave_requests` collection).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{raw, Collection};
use crate::mirror::{MirrorCollection, MirrorEntity, MirrorStore};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveKind {
    #[default]
    Sick,
    Vacation,
    Personal,
    Other,
}

impl LeaveKind {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "VACATION" => LeaveKind::Vacation,
            "PERSONAL" => LeaveKind::Personal,
            "OTHER" => LeaveKind::Other,
            _ => LeaveKind::Sick,
        }
    }

    pub const fn as_wire(self) -> &'static str {
        match self {
            LeaveKind::Sick => "SICK",
            LeaveKind::Vacation => "VACATION",
            LeaveKind::Personal => "PERSONAL",
            LeaveKind::Other => "OTHER",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "APPROVED" => LeaveStatus::Approved,
            "REJECTED" => LeaveStatus::Rejected,
            _ => LeaveStatus::Pending,
        }
    }

    pub const fn as_wire(self) -> &'static str {
        match self {
            LeaveStatus::Pending => "PENDING",
            LeaveStatus::Approved => "APPROVED",
            LeaveStatus::Rejected => "REJECTED",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub id: String,
    pub student_id: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub kind: LeaveKind,
    pub reason: String,
    pub status: LeaveStatus,
}

impl MirrorEntity for LeaveRequest {
    const COLLECTION: Collection = Collection::LeaveRequests;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        LeaveRequest {
            id: raw::string(record, "id"),
            student_id: raw::string(record, "student_id"),
            start_date: raw::opt_date(record, "start_date"),
            end_date: raw::opt_date(record, "end_date"),
            kind: LeaveKind::from_wire(&raw::string(record, "type")),
            reason: raw::string(record, "reason"),
            status: LeaveStatus::from_wire(&raw::string(record, "status")),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.leave_requests
    }
}
