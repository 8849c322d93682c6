//! Cross-cutting attribute bundles shared by several entities.

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// Creation metadata, set once when the row is written and never updated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationInfo {
    pub created_at: Timestamp,
    pub created_by: Option<String>,
}

impl CreationInfo {
    pub fn now(created_by: Option<String>) -> Self {
        Self {
            created_at: Timestamp::now_micros(),
            created_by,
        }
    }
}

/// A required classification code plus an optional free-text source label.
/// Assets carry one keyed as "taxonomy".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub code: String,
    pub source: Option<String>,
}

impl Classification {
    pub fn new(code: impl Into<String>, source: Option<String>) -> Self {
        Self {
            code: code.into(),
            source,
        }
    }
}
