use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A diary entry that already exists on the tracking service for some
/// canonical episode. Read-only to the import pipeline; only referenced
/// when deciding whether to skip, create, or merge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExistingLogEntry {
    /// Entry id on the tracking service, needed when a reviewless stub
    /// gets superseded.
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<DateTime<Utc>>,
    pub has_review: bool,
}

impl ExistingLogEntry {
    /// True when this entry was logged on the given calendar day.
    pub fn matches_day(&self, date: DateTime<Utc>) -> bool {
        self.watched_at
            .map(|w| w.date_naive() == date.date_naive())
            .unwrap_or(false)
    }
}

/// Payload for a diary entry the pipeline is about to write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewLogEntry {
    pub watched_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}
