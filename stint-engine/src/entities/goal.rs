//! Learning goals (`goals` collection).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{raw, Collection};
use crate::mirror::{MirrorCollection, MirrorEntity, MirrorStore};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl GoalStatus {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "IN_PROGRESS" => GoalStatus::InProgress,
            "COMPLETED" => GoalStatus::Completed,
            _ => GoalStatus::NotStarted,
        }
    }

    pub const fn as_wire(self) -> &'static str {
        match self {
            GoalStatus::NotStarted => "NOT_STARTED",
            GoalStatus::InProgress => "IN_PROGRESS",
            GoalStatus::Completed => "COMPLETED",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub student_id: String,
    pub description: String,
    pub category: String,
    pub alignment: String,
    pub status: GoalStatus,
    /// Completion percentage, 0-100.
    pub progress: u32,
}

impl MirrorEntity for Goal {
    const COLLECTION: Collection = Collection::Goals;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        Goal {
            id: raw::string(record, "id"),
            student_id: raw::string(record, "student_id"),
            description: raw::string(record, "description"),
            category: raw::string(record, "category"),
            alignment: raw::string(record, "alignment"),
            status: GoalStatus::from_wire(&raw::string(record, "status")),
            progress: raw::uint_or(record, "progress", 0),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.goals
    }
}
