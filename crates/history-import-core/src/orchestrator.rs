use crate::context::RunContext;
use crate::dedupe::dedupe_events;
use crate::error::ImportError;
use crate::gate::{decide, WriteDecision};
use crate::options::{ImportOptions, ImportOrder};
use crate::resolver::IdentityResolver;
use history_import_models::{
    CanonicalEpisode, ImportOutcome, ImportReport, ImportResult, NewLogEntry, ViewingEvent,
};
use history_import_remote::{MetadataLookup, TrackingService};
use history_import_sources::{source_for, ProgressTracker};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Sequences one import run: read, filter, resolve, dedupe, sort, and
/// write, one event at a time. Collaborators come in as trait objects;
/// the orchestrator knows nothing about TMDB or Serializd specifically.
pub struct ImportOrchestrator {
    metadata: Arc<dyn MetadataLookup>,
    tracker: Arc<dyn TrackingService>,
    options: ImportOptions,
}

impl ImportOrchestrator {
    pub fn new(
        metadata: Arc<dyn MetadataLookup>,
        tracker: Arc<dyn TrackingService>,
        options: ImportOptions,
    ) -> Self {
        Self {
            metadata,
            tracker,
            options,
        }
    }

    /// Run the full pipeline. Only container-level source failures and
    /// pre-run configuration problems abort; per-event trouble lands in
    /// the report.
    #[instrument(skip(self), fields(source = %self.options.source))]
    pub async fn run(&self) -> Result<ImportReport, ImportError> {
        if self.options.dedup_window_days < 0 {
            return Err(ImportError::Configuration(format!(
                "dedup window must be non-negative, got {} days",
                self.options.dedup_window_days
            )));
        }

        let source = source_for(self.options.source);
        info!(
            operation = "import_start",
            source = source.source_name(),
            input = %self.options.input.display(),
            dry_run = self.options.dry_run,
            "Starting import run"
        );

        let events = source.read(&self.options.input)?;
        info!(events = events.len(), "Parsed viewing events");

        let mut report = ImportReport::new(self.options.dry_run);

        // Profile and exclusion filters. Excluded events are accounted
        // for and never reach identity resolution.
        let mut kept: Vec<ViewingEvent> = Vec::new();
        for event in events {
            if let (Some(wanted), Some(profile)) = (&self.options.profile, &event.profile) {
                if profile != wanted {
                    report.record(result_for(&event, ImportOutcome::SkippedProfile));
                    continue;
                }
            }
            if self
                .options
                .excluded_shows
                .contains(&event.show_title.to_lowercase())
            {
                report.record(result_for(&event, ImportOutcome::SkippedExcluded));
                continue;
            }
            kept.push(event);
        }

        // Identity resolution, then grouping by canonical episode.
        let mut resolver = IdentityResolver::new(self.metadata.as_ref(), &self.options.id_overrides);
        let mut groups: HashMap<CanonicalEpisode, Vec<ViewingEvent>> = HashMap::new();
        for event in kept {
            match resolver.resolve(&event.show_title).await {
                Ok(Some(show_id)) => {
                    let episode = CanonicalEpisode::new(show_id, event.season, event.episode);
                    groups.entry(episode).or_default().push(event);
                }
                Ok(None) => {
                    report.record(result_for(&event, ImportOutcome::SkippedUnresolved));
                }
                Err(e) => {
                    warn!(show = %event.show_title, error = %e, "Metadata search failed");
                    report.record(result_for(
                        &event,
                        ImportOutcome::Failed {
                            reason: format!("metadata search failed: {}", e),
                        },
                    ));
                }
            }
        }

        // Per-episode dedup, then one flat list for the global ordering.
        let window = self.options.dedup_window();
        let mut pending: Vec<(CanonicalEpisode, ViewingEvent)> = Vec::new();
        for (episode, group) in groups {
            let split = dedupe_events(group, window);
            for event in split.dropped {
                report.record(result_for(&event, ImportOutcome::SkippedDuplicate));
            }
            for event in split.retained {
                pending.push((episode, event));
            }
        }
        sort_for_order(&mut pending, self.options.order);

        debug!(pending = pending.len(), "Events to import after filtering and dedup");

        // Sequential write loop. Strictly one event at a time: every
        // decision must observe the writes made before it.
        let run_tag = self.options.run_tag();
        let mut ctx = RunContext::new();
        let mut progress = ProgressTracker::new(pending.len(), 25);
        let total = pending.len();

        for (idx, (episode, event)) in pending.into_iter().enumerate() {
            let existing = match ctx.existing_for(self.tracker.as_ref(), &episode).await {
                Ok(existing) => existing,
                Err(e) => {
                    warn!(episode = %episode, error = %e, "Failed to fetch existing entries");
                    progress.record_failed();
                    report.record(result_for(
                        &event,
                        ImportOutcome::Failed {
                            reason: format!("failed to fetch existing entries: {}", e),
                        },
                    ));
                    continue;
                }
            };

            let decision = decide(&event, &existing, self.options.source);
            debug!(
                episode = %episode,
                event = %event.label(),
                decision = ?decision,
                "[{}/{}]",
                idx + 1,
                total
            );

            let is_write = matches!(
                decision,
                WriteDecision::Create { .. } | WriteDecision::MergeAlongside
            );
            let outcome = match decision {
                WriteDecision::Skip => ImportOutcome::SkippedDuplicate,
                WriteDecision::Drop => ImportOutcome::SkippedNoDate,
                WriteDecision::Create { replace } => {
                    self.apply_create(&mut ctx, &episode, &event, replace, &run_tag)
                        .await
                }
                WriteDecision::MergeAlongside => {
                    self.apply_merge(&mut ctx, &episode, &event, &run_tag).await
                }
            };

            match &outcome {
                ImportOutcome::Created | ImportOutcome::Merged => progress.record_written(),
                ImportOutcome::Failed { .. } => progress.record_failed(),
                _ => progress.record_skipped(),
            }
            report.record(result_for(&event, outcome));
            progress.log_progress(idx + 1);

            // Rate limit between remote writes; previews never sleep.
            if is_write && !self.options.dry_run {
                tokio::time::sleep(self.options.write_delay).await;
            }
        }

        progress.log_summary("Import");
        let summary = report.summary();
        info!(
            operation = "import_complete",
            created = summary.created,
            merged = summary.merged,
            failed = summary.failed,
            "Import run finished"
        );
        Ok(report)
    }

    async fn apply_create(
        &self,
        ctx: &mut RunContext,
        episode: &CanonicalEpisode,
        event: &ViewingEvent,
        replace: Option<u64>,
        run_tag: &str,
    ) -> ImportOutcome {
        let Some(entry) = new_entry(event, run_tag) else {
            // The gate drops dateless events before they get here.
            return ImportOutcome::Failed {
                reason: "event has no watch date".to_string(),
            };
        };

        if self.options.dry_run {
            if let Some(old_id) = replace {
                ctx.record_deletion(episode, old_id);
            }
            ctx.record_preview_write(episode, entry.watched_at, entry.review.is_some());
            return ImportOutcome::Created;
        }

        if let Some(old_id) = replace {
            if let Err(e) = self.tracker.delete_entry(old_id).await {
                return ImportOutcome::Failed {
                    reason: format!("failed to replace entry {}: {}", old_id, e),
                };
            }
            ctx.record_deletion(episode, old_id);
        }

        match self.tracker.create_entry(episode, &entry).await {
            Ok(created) => {
                ctx.record_write(episode, created);
                ImportOutcome::Created
            }
            Err(e) => ImportOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    async fn apply_merge(
        &self,
        ctx: &mut RunContext,
        episode: &CanonicalEpisode,
        event: &ViewingEvent,
        run_tag: &str,
    ) -> ImportOutcome {
        let Some(entry) = new_entry(event, run_tag) else {
            return ImportOutcome::Failed {
                reason: "event has no watch date".to_string(),
            };
        };

        if self.options.dry_run {
            ctx.record_preview_write(episode, entry.watched_at, entry.review.is_some());
            return ImportOutcome::Merged;
        }

        match self.tracker.add_entry_alongside(episode, &entry).await {
            Ok(created) => {
                ctx.record_write(episode, created);
                ImportOutcome::Merged
            }
            Err(e) => ImportOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}

fn result_for(event: &ViewingEvent, outcome: ImportOutcome) -> ImportResult {
    ImportResult {
        show_title: event.show_title.clone(),
        season: event.season,
        episode: event.episode,
        watched_at: event.watched_at,
        outcome,
    }
}

fn new_entry(event: &ViewingEvent, run_tag: &str) -> Option<NewLogEntry> {
    let watched_at = event.watched_at?;
    let mut tags = vec![run_tag.to_string()];
    for tag in &event.tags {
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            tags.push(tag.clone());
        }
    }
    Some(NewLogEntry {
        watched_at,
        review: event.review.clone(),
        tags,
    })
}

/// Global write order: by watch time in the requested direction, with
/// dateless events last either way (they have no position in time).
/// Title/season/episode breaks remaining ties so runs are reproducible.
fn sort_for_order(pending: &mut [(CanonicalEpisode, ViewingEvent)], order: ImportOrder) {
    pending.sort_by(|(_, a), (_, b)| {
        let by_time = match (a.watched_at, b.watched_at) {
            (Some(x), Some(y)) => match order {
                ImportOrder::Oldest => x.cmp(&y),
                ImportOrder::Newest => y.cmp(&x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_time
            .then_with(|| a.show_title.cmp(&b.show_title))
            .then_with(|| a.season.cmp(&b.season))
            .then_with(|| a.episode.cmp(&b.episode))
    });
}

#[cfg(test)]
mod tests;
