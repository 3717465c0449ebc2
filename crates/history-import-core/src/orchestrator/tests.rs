use super::*;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use history_import_models::{ExistingLogEntry, SourceKind};
use history_import_remote::{RemoteError, ShowCandidate};
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Metadata mock: fixed candidate list per title, call counting.
struct StaticMetadata {
    shows: HashMap<String, Vec<ShowCandidate>>,
    calls: Mutex<Vec<String>>,
}

impl StaticMetadata {
    fn with_shows(entries: &[(&str, u32)]) -> Self {
        let shows = entries
            .iter()
            .map(|(title, id)| {
                (
                    title.to_string(),
                    vec![ShowCandidate {
                        id: *id,
                        name: title.to_string(),
                        relevance: 10.0,
                    }],
                )
            })
            .collect();
        Self {
            shows,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn searched_titles(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataLookup for StaticMetadata {
    async fn search(&self, title: &str) -> Result<Vec<ShowCandidate>, RemoteError> {
        self.calls.lock().unwrap().push(title.to_string());
        Ok(self.shows.get(title).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct TrackerState {
    entries: HashMap<CanonicalEpisode, Vec<(ExistingLogEntry, Vec<String>)>>,
    next_id: u64,
    /// Watch dates in the order writes arrived, for order assertions.
    write_log: Vec<DateTime<Utc>>,
    deletes: Vec<u64>,
    fail_writes: bool,
}

/// Tracking-service mock that retains state across runs, so idempotency
/// can be asserted by running the orchestrator twice against it.
struct InMemoryTracker {
    state: Mutex<TrackerState>,
}

impl InMemoryTracker {
    fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState {
                next_id: 1,
                ..Default::default()
            }),
        }
    }

    fn failing_writes() -> Self {
        let tracker = Self::new();
        tracker.state.lock().unwrap().fail_writes = true;
        tracker
    }

    fn seed(&self, episode: CanonicalEpisode, entry: ExistingLogEntry) {
        self.state
            .lock()
            .unwrap()
            .entries
            .entry(episode)
            .or_default()
            .push((entry, Vec::new()));
    }

    fn write_count(&self) -> usize {
        self.state.lock().unwrap().write_log.len()
    }

    fn write_log(&self) -> Vec<DateTime<Utc>> {
        self.state.lock().unwrap().write_log.clone()
    }

    fn deletes(&self) -> Vec<u64> {
        self.state.lock().unwrap().deletes.clone()
    }

    fn record(&self, episode: &CanonicalEpisode, entry: &NewLogEntry) -> ExistingLogEntry {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        let created = ExistingLogEntry {
            id,
            watched_at: Some(entry.watched_at),
            has_review: entry.review.is_some(),
        };
        state
            .entries
            .entry(*episode)
            .or_default()
            .push((created.clone(), entry.tags.clone()));
        state.write_log.push(entry.watched_at);
        created
    }
}

#[async_trait]
impl TrackingService for InMemoryTracker {
    async fn existing_entries(
        &self,
        episode: &CanonicalEpisode,
    ) -> Result<Vec<ExistingLogEntry>, RemoteError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .entries
            .get(episode)
            .map(|entries| entries.iter().map(|(e, _)| e.clone()).collect())
            .unwrap_or_default())
    }

    async fn create_entry(
        &self,
        episode: &CanonicalEpisode,
        entry: &NewLogEntry,
    ) -> Result<ExistingLogEntry, RemoteError> {
        if self.state.lock().unwrap().fail_writes {
            return Err(RemoteError::Api {
                status: 500,
                message: "write rejected".to_string(),
            });
        }
        Ok(self.record(episode, entry))
    }

    async fn add_entry_alongside(
        &self,
        episode: &CanonicalEpisode,
        entry: &NewLogEntry,
    ) -> Result<ExistingLogEntry, RemoteError> {
        if self.state.lock().unwrap().fail_writes {
            return Err(RemoteError::Api {
                status: 500,
                message: "write rejected".to_string(),
            });
        }
        Ok(self.record(episode, entry))
    }

    async fn delete_entry(&self, entry_id: u64) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        for entries in state.entries.values_mut() {
            entries.retain(|(e, _)| e.id != entry_id);
        }
        state.deletes.push(entry_id);
        Ok(())
    }

    async fn delete_entries_by_tag(&self, tag: Option<&str>) -> Result<usize, RemoteError> {
        let mut state = self.state.lock().unwrap();
        let mut deleted = 0;
        for entries in state.entries.values_mut() {
            let before = entries.len();
            entries.retain(|(_, tags)| match tag {
                Some(tag) => !tags.iter().any(|t| t == tag),
                None => false,
            });
            deleted += before - entries.len();
        }
        Ok(deleted)
    }
}

fn write_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "show,season,episode,date,review,tags").unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file
}

fn options_for(input: &NamedTempFile) -> ImportOptions {
    ImportOptions::new(SourceKind::Csv, input.path().to_path_buf())
        .with_write_delay(std::time::Duration::ZERO)
}

fn orchestrator(
    metadata: Arc<StaticMetadata>,
    tracker: Arc<InMemoryTracker>,
    options: ImportOptions,
) -> ImportOrchestrator {
    ImportOrchestrator::new(metadata, tracker, options)
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

#[tokio::test]
async fn test_breaking_bad_scenario() {
    // Two viewings a day apart dedupe to the later; first run creates,
    // second run over identical input skips everything.
    let file = write_csv(&[
        "Breaking Bad,1,1,2024-01-15,,",
        "Breaking Bad,1,1,2024-01-16,,",
    ]);
    let metadata = Arc::new(StaticMetadata::with_shows(&[("Breaking Bad", 1396)]));
    let tracker = Arc::new(InMemoryTracker::new());

    let first = orchestrator(metadata.clone(), tracker.clone(), options_for(&file))
        .run()
        .await
        .unwrap();
    let summary = first.summary();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.skipped_duplicate, 1);
    assert_eq!(tracker.write_count(), 1);
    assert_eq!(tracker.write_log()[0], day(16));

    let second = orchestrator(metadata, tracker.clone(), options_for(&file))
        .run()
        .await
        .unwrap();
    let summary = second.summary();
    assert_eq!(summary.created, 0);
    assert_eq!(summary.merged, 0);
    assert_eq!(summary.skipped_duplicate, 2);
    assert_eq!(tracker.write_count(), 1);
}

#[tokio::test]
async fn test_idempotent_across_runs() {
    let file = write_csv(&[
        "Breaking Bad,1,1,2024-01-10,,",
        "Breaking Bad,1,2,2024-01-11,,",
        "Severance,1,1,2024-01-12,,",
    ]);
    let metadata = Arc::new(StaticMetadata::with_shows(&[
        ("Breaking Bad", 1396),
        ("Severance", 95396),
    ]));
    let tracker = Arc::new(InMemoryTracker::new());

    let first = orchestrator(metadata.clone(), tracker.clone(), options_for(&file))
        .run()
        .await
        .unwrap();
    assert_eq!(first.summary().created, 3);

    let second = orchestrator(metadata, tracker.clone(), options_for(&file))
        .run()
        .await
        .unwrap();
    let summary = second.summary();
    assert_eq!(summary.created + summary.merged, 0);
    assert_eq!(summary.skipped_duplicate, 3);
    assert_eq!(tracker.write_count(), 3);
}

#[tokio::test]
async fn test_write_order_oldest_and_newest() {
    let rows = [
        "Severance,1,2,2024-01-20,,",
        "Severance,1,1,2024-01-05,,",
        "Severance,2,1,2024-01-12,,",
    ];
    let metadata = Arc::new(StaticMetadata::with_shows(&[("Severance", 95396)]));

    let file = write_csv(&rows);
    let tracker = Arc::new(InMemoryTracker::new());
    orchestrator(metadata.clone(), tracker.clone(), options_for(&file))
        .run()
        .await
        .unwrap();
    let log = tracker.write_log();
    assert!(log.windows(2).all(|w| w[0] <= w[1]), "oldest-first: {:?}", log);

    let file = write_csv(&rows);
    let tracker = Arc::new(InMemoryTracker::new());
    orchestrator(
        metadata,
        tracker.clone(),
        options_for(&file).with_order(ImportOrder::Newest),
    )
    .run()
    .await
    .unwrap();
    let log = tracker.write_log();
    assert!(log.windows(2).all(|w| w[0] >= w[1]), "newest-first: {:?}", log);
}

#[tokio::test]
async fn test_dateless_events_processed_last() {
    let file = write_csv(&[
        "Severance,1,9,,review without a date,",
        "Severance,1,1,2024-01-05,,",
    ]);
    let metadata = Arc::new(StaticMetadata::with_shows(&[("Severance", 95396)]));
    let tracker = Arc::new(InMemoryTracker::new());

    let report = orchestrator(metadata, tracker, options_for(&file))
        .run()
        .await
        .unwrap();

    // The dateless event sorts last regardless of direction, so its
    // result is recorded after the dated one.
    let last = report.results.last().unwrap();
    assert_eq!(last.episode, 9);
    assert_eq!(last.outcome, ImportOutcome::SkippedNoDate);
}

#[tokio::test]
async fn test_excluded_show_never_reaches_resolver() {
    let file = write_csv(&[
        "Paw Patrol,1,1,2024-01-05,,",
        "Severance,1,1,2024-01-06,,",
    ]);
    let metadata = Arc::new(StaticMetadata::with_shows(&[
        ("Severance", 95396),
        ("Paw Patrol", 57532),
    ]));
    let tracker = Arc::new(InMemoryTracker::new());
    let options = options_for(&file)
        .with_excluded_shows(["PAW PATROL".to_string()].into_iter().collect());

    let report = orchestrator(metadata.clone(), tracker, options)
        .run()
        .await
        .unwrap();

    assert_eq!(report.summary().skipped_excluded, 1);
    assert_eq!(metadata.searched_titles(), vec!["Severance"]);
}

#[tokio::test]
async fn test_unresolved_show_skips_all_its_events() {
    let file = write_csv(&[
        "Obscure Show,1,1,2024-01-05,,",
        "Obscure Show,1,2,2024-01-06,,",
    ]);
    let metadata = Arc::new(StaticMetadata::with_shows(&[]));
    let tracker = Arc::new(InMemoryTracker::new());

    let report = orchestrator(metadata.clone(), tracker.clone(), options_for(&file))
        .run()
        .await
        .unwrap();

    assert_eq!(report.summary().skipped_unresolved, 2);
    assert_eq!(tracker.write_count(), 0);
    // One search despite two events: negative results memoize.
    assert_eq!(metadata.searched_titles().len(), 1);
}

#[tokio::test]
async fn test_severance_scenario_dateless_dropped() {
    // Dateless event, no existing entry: dropped, no write attempted.
    let file = write_csv(&["Severance,1,1,,,"]);
    let metadata = Arc::new(StaticMetadata::with_shows(&[("Severance", 95396)]));
    let tracker = Arc::new(InMemoryTracker::new());

    let report = orchestrator(metadata, tracker.clone(), options_for(&file))
        .run()
        .await
        .unwrap();

    assert_eq!(report.summary().skipped_no_date, 1);
    assert_eq!(tracker.write_count(), 0);
}

#[tokio::test]
async fn test_dateless_event_adopts_existing_entry() {
    let file = write_csv(&["Severance,1,1,,,"]);
    let metadata = Arc::new(StaticMetadata::with_shows(&[("Severance", 95396)]));
    let tracker = Arc::new(InMemoryTracker::new());
    tracker.seed(
        CanonicalEpisode::new(95396, 1, 1),
        ExistingLogEntry {
            id: 77,
            watched_at: Some(day(2)),
            has_review: true,
        },
    );

    let report = orchestrator(metadata, tracker.clone(), options_for(&file))
        .run()
        .await
        .unwrap();

    assert_eq!(report.summary().skipped_duplicate, 1);
    assert_eq!(tracker.write_count(), 0);
}

#[tokio::test]
async fn test_csv_replaces_reviewless_stub() {
    let file = write_csv(&["Severance,1,1,2024-01-10,my review,"]);
    let metadata = Arc::new(StaticMetadata::with_shows(&[("Severance", 95396)]));
    let tracker = Arc::new(InMemoryTracker::new());
    tracker.seed(
        CanonicalEpisode::new(95396, 1, 1),
        ExistingLogEntry {
            id: 41,
            watched_at: Some(day(2)),
            has_review: false,
        },
    );

    let report = orchestrator(metadata, tracker.clone(), options_for(&file))
        .run()
        .await
        .unwrap();

    assert_eq!(report.summary().created, 1);
    assert_eq!(tracker.deletes(), vec![41]);
    assert_eq!(tracker.write_count(), 1);
}

#[tokio::test]
async fn test_csv_merges_alongside_authored_review() {
    let file = write_csv(&["Severance,1,1,2024-01-10,rewatch notes,"]);
    let metadata = Arc::new(StaticMetadata::with_shows(&[("Severance", 95396)]));
    let tracker = Arc::new(InMemoryTracker::new());
    tracker.seed(
        CanonicalEpisode::new(95396, 1, 1),
        ExistingLogEntry {
            id: 41,
            watched_at: Some(day(2)),
            has_review: true,
        },
    );

    let report = orchestrator(metadata, tracker.clone(), options_for(&file))
        .run()
        .await
        .unwrap();

    assert_eq!(report.summary().merged, 1);
    assert!(tracker.deletes().is_empty());
    assert_eq!(tracker.write_count(), 1);
}

#[tokio::test]
async fn test_dry_run_writes_nothing_but_reports_everything() {
    let file = write_csv(&[
        "Breaking Bad,1,1,2024-01-15,,",
        "Breaking Bad,1,1,2024-01-16,,",
        "Severance,1,1,2024-01-12,,",
    ]);
    let metadata = Arc::new(StaticMetadata::with_shows(&[
        ("Breaking Bad", 1396),
        ("Severance", 95396),
    ]));
    let tracker = Arc::new(InMemoryTracker::new());

    let report = orchestrator(
        metadata,
        tracker.clone(),
        options_for(&file).with_dry_run(true),
    )
    .run()
    .await
    .unwrap();

    assert!(report.dry_run);
    let summary = report.summary();
    assert_eq!(summary.created, 2);
    assert_eq!(summary.skipped_duplicate, 1);
    assert_eq!(tracker.write_count(), 0);
}

#[tokio::test]
async fn test_write_failure_is_not_fatal() {
    let file = write_csv(&[
        "Severance,1,1,2024-01-10,,",
        "Severance,1,2,2024-01-11,,",
    ]);
    let metadata = Arc::new(StaticMetadata::with_shows(&[("Severance", 95396)]));
    let tracker = Arc::new(InMemoryTracker::failing_writes());

    let report = orchestrator(metadata, tracker, options_for(&file))
        .run()
        .await
        .unwrap();

    let summary = report.summary();
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.created, 0);
}

#[tokio::test]
async fn test_profile_filter_on_netflix_source() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Profile Name,Start Time,Title").unwrap();
    writeln!(
        file,
        "Michael,2024-01-15 21:00:00,\"Seinfeld: Season 3: The Pen (Episode 5)\""
    )
    .unwrap();
    writeln!(
        file,
        "Sarah,2024-01-16 21:00:00,\"Seinfeld: Season 3: The Dog (Episode 4)\""
    )
    .unwrap();

    let metadata = Arc::new(StaticMetadata::with_shows(&[("Seinfeld", 1400)]));
    let tracker = Arc::new(InMemoryTracker::new());
    let options = ImportOptions::new(SourceKind::Netflix, file.path().to_path_buf())
        .with_profile(Some("Michael".to_string()))
        .with_write_delay(std::time::Duration::ZERO);

    let report = orchestrator(metadata, tracker.clone(), options)
        .run()
        .await
        .unwrap();

    let summary = report.summary();
    assert_eq!(summary.skipped_profile, 1);
    assert_eq!(summary.created, 1);
    assert_eq!(tracker.write_count(), 1);
}

#[tokio::test]
async fn test_negative_dedup_window_is_a_configuration_error() {
    let file = write_csv(&[]);
    let metadata = Arc::new(StaticMetadata::with_shows(&[]));
    let tracker = Arc::new(InMemoryTracker::new());
    let options = options_for(&file).with_dedup_window_days(-1);

    let result = orchestrator(metadata, tracker, options).run().await;
    assert!(matches!(result, Err(ImportError::Configuration(_))));
}

#[tokio::test]
async fn test_missing_source_file_aborts() {
    let options = ImportOptions::new(SourceKind::Csv, "/nonexistent/input.csv".into());
    let metadata = Arc::new(StaticMetadata::with_shows(&[]));
    let tracker = Arc::new(InMemoryTracker::new());

    let result = orchestrator(metadata, tracker, options).run().await;
    assert!(matches!(result, Err(ImportError::Source(_))));
}

#[tokio::test]
async fn test_run_tag_applied_to_writes() {
    let file = write_csv(&["Severance,1,1,2024-01-10,,\"favorites\""]);
    let metadata = Arc::new(StaticMetadata::with_shows(&[("Severance", 95396)]));
    let tracker = Arc::new(InMemoryTracker::new());
    let options = options_for(&file).with_tag(Some("#backfill".to_string()));

    orchestrator(metadata, tracker.clone(), options)
        .run()
        .await
        .unwrap();

    let state = tracker.state.lock().unwrap();
    let (_, tags) = &state.entries[&CanonicalEpisode::new(95396, 1, 1)][0];
    assert_eq!(tags, &vec!["#backfill".to_string(), "favorites".to_string()]);
}
