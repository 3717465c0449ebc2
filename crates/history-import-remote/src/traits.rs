use crate::error::RemoteError;
use async_trait::async_trait;
use history_import_models::{CanonicalEpisode, ExistingLogEntry, NewLogEntry};
use serde::{Deserialize, Serialize};

/// One show returned by a metadata title search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShowCandidate {
    pub id: u32,
    pub name: String,
    /// Service-defined relevance score; higher is a better match. Only
    /// compared between candidates of the same response.
    pub relevance: f64,
}

/// Metadata-lookup collaborator: maps show titles to external show ids.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Search shows by title. An empty result is not an error.
    async fn search(&self, title: &str) -> Result<Vec<ShowCandidate>, RemoteError>;
}

/// Tracking-service collaborator: the diary the pipeline writes into.
/// This is the only persistent store in the system.
#[async_trait]
pub trait TrackingService: Send + Sync {
    /// All diary entries already logged for the episode.
    async fn existing_entries(
        &self,
        episode: &CanonicalEpisode,
    ) -> Result<Vec<ExistingLogEntry>, RemoteError>;

    /// Write a diary entry; returns the entry as the service now holds it.
    async fn create_entry(
        &self,
        episode: &CanonicalEpisode,
        entry: &NewLogEntry,
    ) -> Result<ExistingLogEntry, RemoteError>;

    /// Write an additional entry without disturbing any existing ones.
    async fn add_entry_alongside(
        &self,
        episode: &CanonicalEpisode,
        entry: &NewLogEntry,
    ) -> Result<ExistingLogEntry, RemoteError>;

    /// Remove one entry by id; used when a reviewless stub is superseded.
    async fn delete_entry(&self, entry_id: u64) -> Result<(), RemoteError>;

    /// Remove every entry carrying `tag`, or every entry at all when
    /// `tag` is `None`. Cleanup utility only, never the import path.
    async fn delete_entries_by_tag(&self, tag: Option<&str>) -> Result<usize, RemoteError>;
}
