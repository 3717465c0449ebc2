use history_import_models::SourceKind;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Direction the sorted event list is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportOrder {
    /// Chronological, oldest watch first.
    #[default]
    Oldest,
    /// Reverse chronological, newest watch first.
    Newest,
}

impl FromStr for ImportOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "oldest" => Ok(ImportOrder::Oldest),
            "newest" => Ok(ImportOrder::Newest),
            other => Err(format!("invalid order '{}', use 'oldest' or 'newest'", other)),
        }
    }
}

/// Everything one import run needs to know. Built by the caller from
/// config, files, and flags; the orchestrator never reads config itself.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub source: SourceKind,
    pub input: PathBuf,
    pub dry_run: bool,
    /// Keep only events watched under this profile, where the source
    /// records one.
    pub profile: Option<String>,
    /// Lowercased show titles to drop before identity resolution.
    pub excluded_shows: HashSet<String>,
    /// Viewings of one episode closer together than this collapse into
    /// the latest one.
    pub dedup_window_days: i64,
    pub order: ImportOrder,
    /// Tag attached to every written entry; `None` means the source's
    /// default tag.
    pub tag: Option<String>,
    /// Show title -> external show id, consulted before any search.
    pub id_overrides: HashMap<String, u32>,
    /// Pause between consecutive remote writes.
    pub write_delay: Duration,
}

impl ImportOptions {
    pub fn new(source: SourceKind, input: PathBuf) -> Self {
        Self {
            source,
            input,
            dry_run: false,
            profile: None,
            excluded_shows: HashSet::new(),
            dedup_window_days: 3,
            order: ImportOrder::Oldest,
            tag: None,
            id_overrides: HashMap::new(),
            write_delay: Duration::from_millis(500),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_excluded_shows(mut self, excluded: HashSet<String>) -> Self {
        self.excluded_shows = excluded.into_iter().map(|s| s.to_lowercase()).collect();
        self
    }

    pub fn with_dedup_window_days(mut self, days: i64) -> Self {
        self.dedup_window_days = days;
        self
    }

    pub fn with_order(mut self, order: ImportOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_id_overrides(mut self, overrides: HashMap<String, u32>) -> Self {
        self.id_overrides = overrides;
        self
    }

    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    pub fn dedup_window(&self) -> chrono::Duration {
        chrono::Duration::days(self.dedup_window_days)
    }

    /// The tag this run writes with.
    pub fn run_tag(&self) -> String {
        self.tag
            .clone()
            .unwrap_or_else(|| self.source.default_tag().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_from_str() {
        assert_eq!("oldest".parse::<ImportOrder>().unwrap(), ImportOrder::Oldest);
        assert_eq!("Newest".parse::<ImportOrder>().unwrap(), ImportOrder::Newest);
        assert!("sideways".parse::<ImportOrder>().is_err());
    }

    #[test]
    fn test_run_tag_defaults_to_source_tag() {
        let options = ImportOptions::new(SourceKind::Plex, PathBuf::from("plex.db"));
        assert_eq!(options.run_tag(), "#pleximport");
        let options = options.with_tag(Some("#mytag".to_string()));
        assert_eq!(options.run_tag(), "#mytag");
    }

    #[test]
    fn test_excluded_shows_are_lowercased() {
        let options = ImportOptions::new(SourceKind::Csv, PathBuf::from("in.csv"))
            .with_excluded_shows(HashSet::from(["Paw Patrol".to_string()]));
        assert!(options.excluded_shows.contains("paw patrol"));
    }
}
