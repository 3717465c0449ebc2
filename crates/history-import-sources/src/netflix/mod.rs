pub mod title;

use crate::error::SourceError;
use crate::traits::EventSource;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use history_import_models::{SourceKind, ViewingEvent};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Manual show-id overrides for titles whose search results are known
/// to land on the wrong show. Keys are post-normalization titles.
pub fn builtin_id_overrides() -> HashMap<String, u32> {
    HashMap::from([
        ("The Office UK".to_string(), 2996),
        ("The Office US".to_string(), 2316),
    ])
}

/// Adapter for Netflix `ViewingActivity.csv` exports.
///
/// The export has one row per playback with columns `Title`,
/// `Start Time` (or `Date` in older exports) and `Profile Name`. Season
/// and episode live inside the title string; see [`title`].
pub struct NetflixSource;

impl EventSource for NetflixSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Netflix
    }

    fn source_name(&self) -> &str {
        "Netflix"
    }

    fn read(&self, path: &Path) -> Result<Vec<ViewingEvent>, SourceError> {
        let file = File::open(path)?;
        let mut reader = csv::Reader::from_reader(file);

        let headers = reader.headers()?.clone();
        let header_map: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.to_string(), i))
            .collect();

        if !header_map.contains_key("Title") {
            return Err(SourceError::Format(format!(
                "Netflix export is missing the Title column. Found: {:?}",
                headers.iter().collect::<Vec<_>>()
            )));
        }
        let date_column = ["Start Time", "Date"]
            .into_iter()
            .find(|c| header_map.contains_key(*c))
            .ok_or_else(|| {
                SourceError::Format(
                    "Netflix export has neither a Start Time nor a Date column".to_string(),
                )
            })?;

        let mut events = Vec::new();
        let mut row_count = 0;
        let mut movies_skipped = 0;

        for result in reader.records() {
            row_count += 1;
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!(row = row_count, error = %e, "Skipping unreadable row");
                    continue;
                }
            };

            let raw_title = record.get(header_map["Title"]).unwrap_or("").trim();
            if raw_title.is_empty() {
                continue;
            }

            // Rows without episode structure are movies; only episodes import.
            let parsed = match title::parse_title(raw_title) {
                Some(parsed) => parsed,
                None => {
                    movies_skipped += 1;
                    continue;
                }
            };

            let date_str = record.get(header_map[date_column]).unwrap_or("").trim();
            let watched_at = match parse_watch_date(date_str) {
                Some(watched_at) => watched_at,
                None => {
                    warn!(row = row_count, title = raw_title, date = date_str,
                          "Skipping row with unparseable watch date");
                    continue;
                }
            };

            let profile = header_map
                .get("Profile Name")
                .and_then(|&i| record.get(i))
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string);

            events.push(ViewingEvent {
                show_title: parsed.show_title,
                season: parsed.season,
                episode: parsed.episode,
                watched_at: Some(watched_at),
                profile,
                review: None,
                tags: Vec::new(),
            });
        }

        debug!(
            rows = row_count,
            episodes = events.len(),
            movies_skipped,
            "Parsed Netflix viewing activity"
        );
        Ok(events)
    }
}

/// Netflix writes either "YYYY-MM-DD HH:MM:SS" or a bare "YYYY-MM-DD".
fn parse_watch_date(date_str: &str) -> Option<DateTime<Utc>> {
    if date_str.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_viewing_activity_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Profile Name,Start Time,Duration,Title").unwrap();
        writeln!(
            file,
            "Michael,2024-01-15 21:03:12,00:22:00,\"Seinfeld: Season 3: The Pen (Episode 5)\""
        )
        .unwrap();
        writeln!(
            file,
            "Michael,2024-01-16 20:11:54,00:21:30,\"Seinfeld: Season 3: The Dog (Episode 4)\""
        )
        .unwrap();
        writeln!(
            file,
            "Sarah,2024-02-01 19:00:00,01:49:00,\"Glass Onion: A Knives Out Mystery\""
        )
        .unwrap();
        file
    }

    #[test]
    fn test_parse_viewing_activity() {
        let file = create_viewing_activity_csv();
        let events = NetflixSource.read(file.path()).unwrap();

        assert_eq!(events.len(), 2); // movie filtered out
        assert_eq!(events[0].show_title, "Seinfeld");
        assert_eq!(events[0].season, 3);
        assert_eq!(events[0].episode, 5);
        assert_eq!(events[0].profile.as_deref(), Some("Michael"));
        assert!(events[0].watched_at.is_some());
    }

    #[test]
    fn test_date_only_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Title,Date").unwrap();
        writeln!(file, "\"Seinfeld: Season 3: The Pen (Episode 5)\",2024-01-15").unwrap();

        let events = NetflixSource.read(file.path()).unwrap();
        assert_eq!(events.len(), 1);
        let watched_at = events[0].watched_at.unwrap();
        assert_eq!(watched_at.date_naive().to_string(), "2024-01-15");
    }

    #[test]
    fn test_missing_title_column_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Profile Name,Start Time").unwrap();
        writeln!(file, "Michael,2024-01-15 21:03:12").unwrap();

        let result = NetflixSource.read(file.path());
        assert!(matches!(result, Err(SourceError::Format(_))));
    }

    #[test]
    fn test_bad_date_row_skipped() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Title,Start Time").unwrap();
        writeln!(
            file,
            "\"Seinfeld: Season 3: The Pen (Episode 5)\",not-a-date"
        )
        .unwrap();
        writeln!(
            file,
            "\"Seinfeld: Season 3: The Dog (Episode 4)\",2024-01-15 21:03:12"
        )
        .unwrap();

        let events = NetflixSource.read(file.path()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].episode, 4);
    }
}
