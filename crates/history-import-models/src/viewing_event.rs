use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized per-episode viewing event, as produced by a source adapter.
///
/// Immutable once created. `watched_at` is `None` only for the free-form
/// CSV source; the other adapters drop rows without a usable date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewingEvent {
    pub show_title: String,
    pub season: u32,
    pub episode: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ViewingEvent {
    pub fn new(show_title: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            show_title: show_title.into(),
            season,
            episode,
            watched_at: None,
            profile: None,
            review: None,
            tags: Vec::new(),
        }
    }

    pub fn with_watched_at(mut self, watched_at: DateTime<Utc>) -> Self {
        self.watched_at = Some(watched_at);
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Short human label used in logs and reports, e.g. "Severance S01E02".
    pub fn label(&self) -> String {
        format!("{} S{:02}E{:02}", self.show_title, self.season, self.episode)
    }
}
