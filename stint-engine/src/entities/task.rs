//! Tasks (`tasks` collection), including deliverable submissions and
//! supervisor feedback, both stored as nested objects on the row.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::entities::{raw, Collection};
use crate::mirror::{MirrorCollection, MirrorEntity, MirrorStore};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
    Overdue,
}

impl TaskStatus {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "IN_PROGRESS" => TaskStatus::InProgress,
            "COMPLETED" => TaskStatus::Completed,
            "OVERDUE" => TaskStatus::Overdue,
            _ => TaskStatus::Todo,
        }
    }

    pub const fn as_wire(self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Overdue => "OVERDUE",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "LOW" => TaskPriority::Low,
            "HIGH" => TaskPriority::High,
            _ => TaskPriority::Medium,
        }
    }

    pub const fn as_wire(self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }
}

/// Feedback flavor. Only `Praise` feeds the badge rules, so unknown wire
/// values deliberately fall back to `Guidance`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskFeedbackKind {
    Praise,
    #[default]
    Guidance,
}

impl TaskFeedbackKind {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "PRAISE" => TaskFeedbackKind::Praise,
            _ => TaskFeedbackKind::Guidance,
        }
    }

    pub const fn as_wire(self) -> &'static str {
        match self {
            TaskFeedbackKind::Praise => "PRAISE",
            TaskFeedbackKind::Guidance => "GUIDANCE",
        }
    }
}

/// Supervisor feedback on a completed task.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TaskFeedback {
    pub kind: TaskFeedbackKind,
    pub comment: String,
}

impl TaskFeedback {
    pub fn from_record(record: &Value) -> Self {
        TaskFeedback {
            kind: TaskFeedbackKind::from_wire(&raw::string(record, "type")),
            comment: raw::string(record, "comment"),
        }
    }

    pub fn to_wire(&self) -> Value {
        json!({ "type": self.kind.as_wire(), "comment": self.comment })
    }
}

/// A student's submission against a task.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TaskDeliverable {
    pub url: Option<String>,
    pub note: String,
    pub submitted_at: DateTime<Utc>,
}

impl TaskDeliverable {
    pub fn from_record(record: &Value) -> Self {
        TaskDeliverable {
            url: raw::opt_string(record, "url"),
            note: raw::string(record, "note"),
            submitted_at: raw::timestamp_or_now(record, "submitted_at"),
        }
    }

    pub fn to_wire(&self) -> Value {
        json!({
            "url": self.url,
            "note": self.note,
            "submitted_at": self.submitted_at.to_rfc3339(),
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub assigned_to_id: String,
    pub assigned_by_id: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub deliverable: Option<TaskDeliverable>,
    pub feedback: Option<TaskFeedback>,
    pub linked_goal_id: Option<String>,
}

impl MirrorEntity for Task {
    const COLLECTION: Collection = Collection::Tasks;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        Task {
            id: raw::string(record, "id"),
            title: raw::string(record, "title"),
            description: raw::string(record, "description"),
            assigned_to_id: raw::string(record, "assigned_to_id"),
            assigned_by_id: raw::string(record, "assigned_by_id"),
            status: TaskStatus::from_wire(&raw::string(record, "status")),
            priority: TaskPriority::from_wire(&raw::string(record, "priority")),
            due_date: raw::opt_date(record, "due_date"),
            created_at: raw::timestamp_or_now(record, "created_at"),
            deliverable: raw::object(record, "deliverable").map(TaskDeliverable::from_record),
            feedback: raw::object(record, "feedback").map(TaskFeedback::from_record),
            linked_goal_id: raw::opt_string(record, "linked_goal_id"),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.tasks
    }
}
