//! Shared learning resources (`resources` collection).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{raw, Collection};
use crate::mirror::{MirrorCollection, MirrorEntity, MirrorStore};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    #[default]
    Link,
    Pdf,
    Doc,
    Image,
    Zip,
}

impl ResourceKind {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "PDF" => ResourceKind::Pdf,
            "DOC" => ResourceKind::Doc,
            "IMAGE" => ResourceKind::Image,
            "ZIP" => ResourceKind::Zip,
            _ => ResourceKind::Link,
        }
    }

    pub const fn as_wire(self) -> &'static str {
        match self {
            ResourceKind::Link => "LINK",
            ResourceKind::Pdf => "PDF",
            ResourceKind::Doc => "DOC",
            ResourceKind::Image => "IMAGE",
            ResourceKind::Zip => "ZIP",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub kind: ResourceKind,
    pub url: String,
    pub uploaded_by: String,
    pub upload_date: DateTime<Utc>,
}

impl MirrorEntity for Resource {
    const COLLECTION: Collection = Collection::Resources;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_record(record: &Value) -> Self {
        Resource {
            id: raw::string(record, "id"),
            title: raw::string(record, "title"),
            kind: ResourceKind::from_wire(&raw::string(record, "type")),
            url: raw::string_or(record, "url", "#"),
            uploaded_by: raw::string(record, "uploaded_by"),
            upload_date: raw::timestamp_or_now(record, "upload_date"),
        }
    }

    fn slot(store: &MirrorStore) -> &MirrorCollection<Self> {
        &store.resources
    }
}
