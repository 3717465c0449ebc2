use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of viewing-history source a run imports from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Netflix ViewingActivity.csv export
    Netflix,
    /// Plex media-server SQLite database
    Plex,
    /// Hand-authored CSV with explicit show/season/episode columns
    Csv,
}

impl SourceKind {
    /// Tag attached to every entry this source imports, unless the
    /// caller overrides it for the run.
    pub fn default_tag(&self) -> &'static str {
        match self {
            SourceKind::Netflix => "#netfliximport",
            SourceKind::Plex => "#pleximport",
            SourceKind::Csv => "#csvimport",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Netflix => write!(f, "netflix"),
            SourceKind::Plex => write!(f, "plex"),
            SourceKind::Csv => write!(f, "csv"),
        }
    }
}
