use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final disposition of one viewing event after a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportOutcome {
    /// New diary entry written (or would be, in dry-run).
    Created,
    /// Entry added alongside an existing one that had to be preserved.
    Merged,
    /// Already logged on the same day, or collapsed by the dedup window.
    SkippedDuplicate,
    /// Show title matched the exclusion list.
    SkippedExcluded,
    /// Event belongs to a different profile than the one requested.
    SkippedProfile,
    /// Metadata search returned no candidates for the show title.
    SkippedUnresolved,
    /// Dateless event with no existing entry to adopt a date from.
    SkippedNoDate,
    /// Remote call failed for this event; the run continued.
    Failed { reason: String },
}

impl ImportOutcome {
    /// True for outcomes that perform (or preview) a remote write.
    pub fn is_write(&self) -> bool {
        matches!(self, ImportOutcome::Created | ImportOutcome::Merged)
    }
}

/// Per-event outcome record. One of these exists for every event a
/// source adapter produced, filtered or not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportResult {
    pub show_title: String,
    pub season: u32,
    pub episode: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<DateTime<Utc>>,
    pub outcome: ImportOutcome,
}

/// Accumulated results for a whole run; doubles as the dry-run preview.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub dry_run: bool,
    pub results: Vec<ImportResult>,
}

/// Aggregate counts derived from an [`ImportReport`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    pub total: usize,
    pub created: usize,
    pub merged: usize,
    pub skipped_duplicate: usize,
    pub skipped_excluded: usize,
    pub skipped_profile: usize,
    pub skipped_unresolved: usize,
    pub skipped_no_date: usize,
    pub failed: usize,
}

impl ImportReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            results: Vec::new(),
        }
    }

    pub fn record(&mut self, result: ImportResult) {
        self.results.push(result);
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            total: self.results.len(),
            ..Default::default()
        };
        for result in &self.results {
            match result.outcome {
                ImportOutcome::Created => summary.created += 1,
                ImportOutcome::Merged => summary.merged += 1,
                ImportOutcome::SkippedDuplicate => summary.skipped_duplicate += 1,
                ImportOutcome::SkippedExcluded => summary.skipped_excluded += 1,
                ImportOutcome::SkippedProfile => summary.skipped_profile += 1,
                ImportOutcome::SkippedUnresolved => summary.skipped_unresolved += 1,
                ImportOutcome::SkippedNoDate => summary.skipped_no_date += 1,
                ImportOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    /// Events that ended in `Failed`, for the end-of-run error listing.
    pub fn failures(&self) -> impl Iterator<Item = &ImportResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, ImportOutcome::Failed { .. }))
    }
}
