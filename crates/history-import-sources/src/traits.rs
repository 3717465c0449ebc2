use crate::csv_file::CsvFileSource;
use crate::error::SourceError;
use crate::netflix::NetflixSource;
use crate::plex::PlexSource;
use history_import_models::{SourceKind, ViewingEvent};
use std::path::Path;

/// A viewing-history source adapter.
///
/// Each source (Netflix export, Plex database, free-form CSV) implements
/// this to parse its storage format into normalized [`ViewingEvent`]s.
/// Adapters never filter by profile or exclusion list; the orchestrator
/// owns those. They do drop non-episodic entries (movies) and malformed
/// rows, so everything returned is importable in principle.
pub trait EventSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Human-readable source name, e.g. "Netflix".
    fn source_name(&self) -> &str;

    fn default_tag(&self) -> &str {
        self.kind().default_tag()
    }

    /// Parse the file at `path` into viewing events.
    ///
    /// Returns `SourceError::Format` when the container itself is
    /// unusable (missing columns or tables). Individual malformed rows
    /// are logged at warn level and skipped.
    fn read(&self, path: &Path) -> Result<Vec<ViewingEvent>, SourceError>;
}

/// Construct the adapter for a source kind.
pub fn source_for(kind: SourceKind) -> Box<dyn EventSource> {
    match kind {
        SourceKind::Netflix => Box::new(NetflixSource),
        SourceKind::Plex => Box::new(PlexSource),
        SourceKind::Csv => Box::new(CsvFileSource),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_matches_kind() {
        for kind in [SourceKind::Netflix, SourceKind::Plex, SourceKind::Csv] {
            assert_eq!(source_for(kind).kind(), kind);
        }
    }

    #[test]
    fn test_default_tags() {
        assert_eq!(source_for(SourceKind::Netflix).default_tag(), "#netfliximport");
        assert_eq!(source_for(SourceKind::Plex).default_tag(), "#pleximport");
        assert_eq!(source_for(SourceKind::Csv).default_tag(), "#csvimport");
    }
}
