use chrono::{DateTime, Duration, Utc};
use history_import_models::ViewingEvent;

/// Result of deduplicating one episode's viewings: what survives, in
/// chronological order, and what was collapsed away.
#[derive(Debug, Default)]
pub struct DedupSplit {
    pub retained: Vec<ViewingEvent>,
    pub dropped: Vec<ViewingEvent>,
}

/// Collapse near-duplicate viewings of a single canonical episode.
///
/// All `events` must belong to one episode. Dated events are scanned in
/// chronological order; whenever the next viewing starts strictly less
/// than `window` after the currently retained one, the earlier viewing
/// is dropped and the later kept. This models starting an episode,
/// falling asleep, and rewatching it shortly after: the rewatch is the
/// viewing that counts. A gap of `window` or more is a legitimate
/// rewatch and starts a new retained viewing.
///
/// Dateless events carry no position in time and are never merged with
/// anything; they pass through untouched, after the dated ones.
///
/// Pure: no clock, no remote calls.
pub fn dedupe_events(events: Vec<ViewingEvent>, window: Duration) -> DedupSplit {
    let mut dated: Vec<(DateTime<Utc>, ViewingEvent)> = Vec::new();
    let mut dateless: Vec<ViewingEvent> = Vec::new();
    for event in events {
        match event.watched_at {
            Some(ts) => dated.push((ts, event)),
            None => dateless.push(event),
        }
    }
    dated.sort_by_key(|(ts, _)| *ts);

    let mut split = DedupSplit::default();
    let mut retained: Vec<(DateTime<Utc>, ViewingEvent)> = Vec::new();
    for (ts, event) in dated {
        match retained.last() {
            Some((last_ts, _)) if ts - *last_ts < window => {
                // Same burst: the later viewing replaces the earlier.
                if let Some((_, earlier)) = retained.pop() {
                    split.dropped.push(earlier);
                }
                retained.push((ts, event));
            }
            _ => retained.push((ts, event)),
        }
    }

    split.retained = retained.into_iter().map(|(_, event)| event).collect();
    split.retained.extend(dateless);
    split
}
