use crate::error::SourceError;
use crate::traits::EventSource;
use chrono::DateTime;
use history_import_models::{SourceKind, ViewingEvent};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::{debug, warn};

/// Adapter for Plex media-server SQLite databases.
///
/// Plex denormalizes playback history into `metadata_item_views`:
/// `grandparent_title` is the show, `parent_index` the season, `index`
/// the episode, `viewed_at` a unix timestamp. `metadata_type = 4`
/// restricts the query to episodes (1 = movie, 2 = show, 3 = season).
/// Viewer names come from the joined `accounts` table.
pub struct PlexSource;

// "index" is a reserved word in SQLite, hence the backticks.
const VIEW_QUERY: &str = "\
SELECT
    views.grandparent_title,
    views.parent_index,
    views.`index`,
    views.viewed_at,
    accounts.name
FROM metadata_item_views views
JOIN accounts ON views.account_id = accounts.id
WHERE views.metadata_type = 4";

impl EventSource for PlexSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Plex
    }

    fn source_name(&self) -> &str {
        "Plex"
    }

    fn read(&self, path: &Path) -> Result<Vec<ViewingEvent>, SourceError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| SourceError::Format(format!("cannot open Plex database: {}", e)))?;

        // A missing view table means this is not a Plex library database.
        let mut stmt = conn.prepare(VIEW_QUERY).map_err(|e| {
            SourceError::Format(format!("not a Plex database (missing view tables): {}", e))
        })?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut events = Vec::new();
        let mut rows_skipped = 0;

        for row in rows {
            let (show_title, season, episode, viewed_at, account) = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable view row");
                    rows_skipped += 1;
                    continue;
                }
            };

            let show_title = match show_title.map(|t| t.trim().to_string()) {
                Some(t) if !t.is_empty() => t,
                _ => {
                    rows_skipped += 1;
                    continue;
                }
            };

            // Orphaned view rows can carry NULL season/episode numbers.
            let (season, episode) = match (season, episode) {
                (Some(s), Some(e)) if s >= 0 && e >= 0 => (s as u32, e as u32),
                _ => {
                    warn!(show = %show_title, "Skipping view row without season/episode");
                    rows_skipped += 1;
                    continue;
                }
            };

            let watched_at = match DateTime::from_timestamp(viewed_at, 0) {
                Some(watched_at) => watched_at,
                None => {
                    warn!(show = %show_title, viewed_at, "Skipping view row with invalid timestamp");
                    rows_skipped += 1;
                    continue;
                }
            };

            events.push(ViewingEvent {
                show_title,
                season,
                episode,
                watched_at: Some(watched_at),
                profile: account.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
                review: None,
                tags: Vec::new(),
            });
        }

        debug!(
            episodes = events.len(),
            rows_skipped,
            "Parsed Plex view history"
        );
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_plex_db(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("plex.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE accounts (id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE metadata_item_views (
                 id INTEGER PRIMARY KEY,
                 account_id INTEGER,
                 grandparent_title TEXT,
                 parent_index INTEGER,
                 `index` INTEGER,
                 metadata_type INTEGER,
                 viewed_at INTEGER
             );
             INSERT INTO accounts (id, name) VALUES (1, 'mwest56'), (2, 'guest');
             -- episode view
             INSERT INTO metadata_item_views
                 (account_id, grandparent_title, parent_index, `index`, metadata_type, viewed_at)
                 VALUES (1, 'Severance', 1, 2, 4, 1705363200);
             -- movie view, must be filtered
             INSERT INTO metadata_item_views
                 (account_id, grandparent_title, parent_index, `index`, metadata_type, viewed_at)
                 VALUES (1, 'Heat', NULL, NULL, 1, 1705363200);
             -- episode with NULL season, must be skipped
             INSERT INTO metadata_item_views
                 (account_id, grandparent_title, parent_index, `index`, metadata_type, viewed_at)
                 VALUES (2, 'Severance', NULL, 3, 4, 1705449600);",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_parse_plex_database() {
        let dir = TempDir::new().unwrap();
        let path = create_plex_db(&dir);

        let events = PlexSource.read(&path).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].show_title, "Severance");
        assert_eq!(events[0].season, 1);
        assert_eq!(events[0].episode, 2);
        assert_eq!(events[0].profile.as_deref(), Some("mwest56"));
        assert_eq!(
            events[0].watched_at.unwrap().date_naive().to_string(),
            "2024-01-16"
        );
    }

    #[test]
    fn test_non_plex_database_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("other.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE unrelated (id INTEGER);").unwrap();
        drop(conn);

        let result = PlexSource.read(&path);
        assert!(matches!(result, Err(SourceError::Format(_))));
    }
}
