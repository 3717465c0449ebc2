use history_import_models::{ExistingLogEntry, SourceKind, ViewingEvent};

/// What to do with one deduplicated event, given everything already
/// logged for its episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteDecision {
    /// Already satisfied; write nothing.
    Skip,
    /// Write a new entry. `replace` names a reviewless stub that the new
    /// entry supersedes (deleted before the create).
    Create { replace: Option<u64> },
    /// Write a new entry next to the existing ones, which carry content
    /// that must be preserved verbatim.
    MergeAlongside,
    /// Dateless event with nothing to adopt a date from; cannot be
    /// logged at all.
    Drop,
}

/// The idempotency gate: decides skip / create / merge for one event.
///
/// Pure and evaluated independently per event. `existing` must include
/// entries created earlier in the same run for the same episode; the
/// run context takes care of that. This is what makes a re-run over the
/// same input converge to all-skips.
pub fn decide(
    event: &ViewingEvent,
    existing: &[ExistingLogEntry],
    source: SourceKind,
) -> WriteDecision {
    match event.watched_at {
        Some(watched_at) => {
            // Exact-day match: this viewing is already logged.
            if existing.iter().any(|e| e.matches_day(watched_at)) {
                return WriteDecision::Skip;
            }
        }
        None => {
            // Only the free-form CSV source emits dateless events. An
            // existing entry (whatever its date) already satisfies it;
            // otherwise there is no date to log under.
            return if existing.is_empty() {
                WriteDecision::Drop
            } else {
                WriteDecision::Skip
            };
        }
    }

    if source == SourceKind::Csv && !existing.is_empty() {
        // CSV rows can carry review text, so an existing entry matters:
        // a reviewless stub is superseded; authored reviews are kept
        // and the new entry goes alongside.
        return match existing.iter().find(|e| !e.has_review) {
            Some(stub) => WriteDecision::Create {
                replace: Some(stub.id),
            },
            None => WriteDecision::MergeAlongside,
        };
    }

    WriteDecision::Create { replace: None }
}
