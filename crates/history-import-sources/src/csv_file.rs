use crate::error::SourceError;
use crate::traits::EventSource;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use history_import_models::{SourceKind, ViewingEvent};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Date formats accepted in the free-form CSV, tried in order.
const DATE_FORMATS: [&str; 4] = [
    "%Y-%m-%d",          // 2024-04-15
    "%B %d, %Y",         // April 15, 2024
    "%B %d %Y",          // April 15 2024
    "%d/%m/%Y",          // 15/04/2024
];

const DATETIME_FORMATS: [&str; 1] = [
    "%Y-%m-%dT%H:%M:%S", // 2024-04-15T12:00:00
];

/// Adapter for hand-authored CSV files.
///
/// Required columns: `show`, `season`, `episode`. Optional: `date`
/// (several formats, may be blank), `review`, `tags` (comma-separated).
/// This is the only source allowed to emit dateless events; whether a
/// dateless event survives depends on the merge policy downstream.
pub struct CsvFileSource;

impl EventSource for CsvFileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Csv
    }

    fn source_name(&self) -> &str {
        "CSV"
    }

    fn read(&self, path: &Path) -> Result<Vec<ViewingEvent>, SourceError> {
        let file = File::open(path)?;
        let mut reader = csv::Reader::from_reader(file);

        let headers = reader.headers()?.clone();
        let header_map: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();

        let missing: Vec<&str> = ["show", "season", "episode"]
            .into_iter()
            .filter(|c| !header_map.contains_key(*c))
            .collect();
        if !missing.is_empty() {
            return Err(SourceError::Format(format!(
                "CSV is missing required columns: {}. Found: {:?}",
                missing.join(", "),
                headers.iter().collect::<Vec<_>>()
            )));
        }

        let column = |record: &csv::StringRecord, name: &str| -> String {
            header_map
                .get(name)
                .and_then(|&i| record.get(i))
                .unwrap_or("")
                .trim()
                .to_string()
        };

        let mut events = Vec::new();
        let mut row_count = 0;

        for result in reader.records() {
            row_count += 1;
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!(row = row_count, error = %e, "Skipping unreadable row");
                    continue;
                }
            };

            let show_title = column(&record, "show");
            let season = column(&record, "season").parse::<u32>().unwrap_or(0);
            let episode = column(&record, "episode").parse::<u32>().unwrap_or(0);
            if show_title.is_empty() || season == 0 || episode == 0 {
                warn!(row = row_count, "Skipping row without show/season/episode");
                continue;
            }

            let date_str = column(&record, "date");
            let watched_at = parse_date(&date_str);
            if watched_at.is_none() && !date_str.is_empty() {
                warn!(row = row_count, date = %date_str,
                      "Date not in a recognized format, importing as dateless");
            }

            let review = Some(column(&record, "review")).filter(|r| !r.is_empty());
            let tags: Vec<String> = column(&record, "tags")
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();

            events.push(ViewingEvent {
                show_title,
                season,
                episode,
                watched_at,
                profile: None,
                review,
                tags,
            });
        }

        debug!(rows = row_count, episodes = events.len(), "Parsed CSV episodes");
        Ok(events)
    }
}

/// Try each accepted format; `None` when the string is empty or matches
/// none of them.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let date_str = date_str.trim();
    if date_str.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(date_str, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    // US-style month-first dates share a shape with day-first; try last
    // so unambiguous day-first parses win.
    NaiveDate::parse_from_str(date_str, "%m/%d/%Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "show,season,episode,date,review,tags").unwrap();
        writeln!(file, "Severance,1,1,2024-04-15,Loved it,\"favorites, rewatch\"").unwrap();
        writeln!(file, "Severance,1,2,\"April 16, 2024\",,").unwrap();
        writeln!(file, "Severance,1,3,,,").unwrap();
        file
    }

    #[test]
    fn test_parse_csv() {
        let file = create_csv();
        let events = CsvFileSource.read(file.path()).unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].show_title, "Severance");
        assert_eq!(events[0].review.as_deref(), Some("Loved it"));
        assert_eq!(events[0].tags, vec!["favorites", "rewatch"]);
        assert_eq!(
            events[1].watched_at.unwrap().date_naive().to_string(),
            "2024-04-16"
        );
        assert_eq!(events[2].watched_at, None);
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "show,season").unwrap();
        writeln!(file, "Severance,1").unwrap();

        let result = CsvFileSource.read(file.path());
        assert!(matches!(result, Err(SourceError::Format(_))));
    }

    #[test]
    fn test_zero_season_row_skipped() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "show,season,episode").unwrap();
        writeln!(file, "Severance,0,1").unwrap();
        writeln!(file, "Severance,1,1").unwrap();

        let events = CsvFileSource.read(file.path()).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_date_formats() {
        for (raw, expect) in [
            ("2024-04-15", "2024-04-15"),
            ("2024-04-15T12:00:00", "2024-04-15"),
            ("April 15, 2024", "2024-04-15"),
            ("April 15 2024", "2024-04-15"),
            ("15/04/2024", "2024-04-15"),
            ("04/15/2024", "2024-04-15"), // month 15 is invalid day-first, US fallback applies
            ("05/04/2024", "2024-04-05"), // ambiguous shape, day-first wins
        ] {
            let parsed = parse_date(raw).unwrap();
            assert_eq!(parsed.date_naive().to_string(), expect, "input {}", raw);
        }
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
    }
}
