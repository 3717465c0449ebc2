use history_import_models::{CanonicalEpisode, ExistingLogEntry};
use history_import_remote::{RemoteError, TrackingService};
use std::collections::HashMap;

/// Run-scoped state threaded through the pipeline: the existing-entries
/// cache, lazily filled from the tracking service and updated with every
/// write this run performs, so each gate decision observes all prior
/// writes for the same episode. Constructed at run start, discarded at
/// run end; runs share nothing.
pub struct RunContext {
    existing: HashMap<CanonicalEpisode, Vec<ExistingLogEntry>>,
    /// Ids handed to entries recorded in dry-run mode, where the remote
    /// never assigns one. Counts down from the top so they cannot
    /// collide with real ids within a preview.
    next_preview_id: u64,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            existing: HashMap::new(),
            next_preview_id: u64::MAX,
        }
    }

    /// The episode's existing entries, fetched once per run. Fetch
    /// errors are not cached; a later event for the same episode
    /// retries.
    pub async fn existing_for(
        &mut self,
        tracker: &dyn TrackingService,
        episode: &CanonicalEpisode,
    ) -> Result<Vec<ExistingLogEntry>, RemoteError> {
        if !self.existing.contains_key(episode) {
            let entries = tracker.existing_entries(episode).await?;
            self.existing.insert(*episode, entries);
        }
        Ok(self.existing.get(episode).cloned().unwrap_or_default())
    }

    /// Fold a just-written entry into the cache so later decisions for
    /// the same episode see it.
    pub fn record_write(&mut self, episode: &CanonicalEpisode, entry: ExistingLogEntry) {
        self.existing.entry(*episode).or_default().push(entry);
    }

    /// Drop a superseded stub from the cache after it was deleted
    /// remotely.
    pub fn record_deletion(&mut self, episode: &CanonicalEpisode, entry_id: u64) {
        if let Some(entries) = self.existing.get_mut(episode) {
            entries.retain(|e| e.id != entry_id);
        }
    }

    /// Record a write that dry-run mode did not perform, with a
    /// synthetic id, so the preview converges the way a real run would.
    pub fn record_preview_write(
        &mut self,
        episode: &CanonicalEpisode,
        watched_at: chrono::DateTime<chrono::Utc>,
        has_review: bool,
    ) {
        let id = self.next_preview_id;
        self.next_preview_id -= 1;
        self.record_write(
            episode,
            ExistingLogEntry {
                id,
                watched_at: Some(watched_at),
                has_review,
            },
        );
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
