//! Formal evaluations (`evaluations` collection). Scores are per-category
//! entries nested on the row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::entities::{raw, Collection};
use crate::mirror::{MirrorCollection, MirrorEntity, MirrorStore};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationKind {
    #[default]
    MidTerm,
    Final,
}

impl EvaluationKind {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "FINAL" => EvaluationKind::Final,
            _ => EvaluationKind::MidTerm,
        }
    }

    pub const fn as_wire(self) -> &'static str {
        match self {
            EvaluationKind::MidTerm => "MID_TERM",
            EvaluationKind::Final => "FINAL",
        }
    }
}

/// One scored category, e.g. "Communication" at 4 of 5.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationScore {
    pub category: String,
    pub score: u32,
}

impl EvaluationScore {
    pub fn from_record(record: &Value) -> Self {
        EvaluationScore {
            category: raw::string(record, "category"),
            score: raw::uint_or(record, "score", 0),
        }
    }

    pub fn to_wire(&self) -> Value {
        json!({ "category": self.category, "score": self.score })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: String,
    pub student_id: String,
    pub supervisor_id: String,
    pub kind: EvaluationKind,
    pub date: DateTime<Utc>,
    pub scores: Vec<EvaluationScore>,
    pub overall_feedback: String,
}

impl MirrorEntity for Evaluation {
    const COLLECTION: Collection = Collection::Evaluations;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        Evaluation {
            id: raw::string(record, "id"),
            student_id: raw::string(record, "student_id"),
            supervisor_id: raw::string(record, "supervisor_id"),
            kind: EvaluationKind::from_wire(&raw::string(record, "type")),
            date: raw::timestamp_or_now(record, "date"),
            scores: raw::items(record, "scores")
                .iter()
                .map(EvaluationScore::from_record)
                .collect(),
            overall_feedback: raw::string(record, "overall_feedback"),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.evaluations
    }
}
