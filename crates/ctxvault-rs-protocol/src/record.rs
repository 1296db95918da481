//! Context record model shared by the store and its callers.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A single stored context item.
///
/// Serialized with camelCase keys; this is the exact document written to a
/// record file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextRecord {
    /// Stable identifier, also used as the file key.
    pub id: String,
    /// Short human readable title. Must not be blank.
    pub title: String,
    /// Record body. May be empty.
    pub content: String,
    /// Free-form tags, order preserved.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Opaque caller metadata.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Creation time in milliseconds since the epoch.
    #[serde(default)]
    pub created_at: i64,
    /// Last save time in milliseconds since the epoch.
    #[serde(default)]
    pub updated_at: i64,
}

impl ContextRecord {
    /// Create a record with a fresh UUID and both timestamps set to now.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            metadata: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the generated id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Replace the tag list.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Insert a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Check the required-field invariant.
    ///
    /// The same rules apply on save and on load: the id must be a safe file
    /// key and the title must contain at least one non-whitespace character.
    pub fn validate(&self) -> Result<(), RecordError> {
        validate_id(&self.id)?;
        if self.title.trim().is_empty() {
            return Err(RecordError::EmptyTitle(self.id.clone()));
        }
        Ok(())
    }
}

/// Reasons a record fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// The id is empty.
    #[error("record id is empty")]
    EmptyId,
    /// The id cannot be used as a file name.
    #[error("record id is not a safe file key: {0:?}")]
    UnsafeId(String),
    /// The title is empty or whitespace.
    #[error("record {0} has an empty title")]
    EmptyTitle(String),
}

/// Check that an id can be used verbatim as a file stem.
pub fn validate_id(id: &str) -> Result<(), RecordError> {
    if id.is_empty() {
        return Err(RecordError::EmptyId);
    }
    let unsafe_char = id
        .chars()
        .any(|ch| ch == '/' || ch == '\\' || ch == '\0' || ch.is_control());
    if unsafe_char || id.starts_with('.') {
        return Err(RecordError::UnsafeId(id.to_string()));
    }
    Ok(())
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
