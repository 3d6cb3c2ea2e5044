use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Fields a caller supplies to create a model. `value` is deliberately a
/// strict integer on the server side; payloads carrying any other scalar are
/// rejected at deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDraft {
    pub name: String,
    pub value: i64,
}

/// A stored model. `date` is stamped once, when the record is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub name: String,
    pub value: i64,
    pub date: NaiveDate,
}

impl ModelRecord {
    pub fn stamped(draft: ModelDraft) -> Self {
        Self {
            name: draft.name,
            value: draft.value,
            date: Utc::now().date_naive(),
        }
    }
}

/// Success envelope: `{"message": ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReply {
    pub message: String,
}

/// Rejection envelope: `{"detail": ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub detail: String,
}

/// Validation envelope for undecodable payloads: `{"errors": [...]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<String>,
}
