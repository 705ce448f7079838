//! Skill catalog (`skills`) and per-student skill assessments
//! (`skill_assessments`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::entities::{raw, Collection, Role};
use crate::mirror::{MirrorCollection, MirrorEntity, MirrorStore};

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub category: String,
}

impl MirrorEntity for Skill {
    const COLLECTION: Collection = Collection::Skills;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        Skill {
            id: raw::string(record, "id"),
            name: raw::string(record, "name"),
            category: raw::string_or(record, "category", "Technical"),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.skills
    }
}

/// One rated skill within an assessment.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SkillRating {
    pub skill_id: String,
    pub score: u32,
}

impl SkillRating {
    pub fn from_record(record: &Value) -> Self {
        SkillRating {
            skill_id: raw::string(record, "skillId"),
            score: raw::uint_or(record, "score", 0),
        }
    }

    pub fn to_wire(&self) -> Value {
        json!({ "skillId": self.skill_id, "score": self.score })
    }
}

/// A self- or supervisor-assessment. `rater_role` records which side rated,
/// so both views can coexist per student.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SkillAssessment {
    pub id: String,
    pub student_id: String,
    pub rater_id: String,
    pub rater_role: Role,
    pub date: DateTime<Utc>,
    pub ratings: Vec<SkillRating>,
}

impl MirrorEntity for SkillAssessment {
    const COLLECTION: Collection = Collection::SkillAssessments;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        SkillAssessment {
            id: raw::string(record, "id"),
            student_id: raw::string(record, "student_id"),
            rater_id: raw::string(record, "rater_id"),
            rater_role: Role::from_wire(&raw::string(record, "role")),
            date: raw::timestamp_or_now(record, "date"),
            ratings: raw::items(record, "ratings")
                .iter()
                .map(SkillRating::from_record)
                .collect(),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.skill_assessments
    }
}
