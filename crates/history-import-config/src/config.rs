use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk configuration (`~/.config/epilog/config.toml`). Everything is
/// optional; command-line flags and environment variables win over it.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tmdb: Option<TmdbConfig>,
    #[serde(default)]
    pub serializd: Option<SerializdConfig>,
    #[serde(default)]
    pub import: ImportDefaults,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TmdbConfig {
    pub api_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SerializdConfig {
    pub email: String,
}

/// Default knobs for import runs; each can be overridden per run.
#[derive(Debug, Serialize, Deserialize)]
pub struct ImportDefaults {
    #[serde(default = "default_dedup_window_days")]
    pub dedup_window_days: i64,

    /// "oldest" or "newest".
    #[serde(default = "default_order")]
    pub order: String,

    /// Pause between consecutive remote writes.
    #[serde(default = "default_write_delay_ms")]
    pub write_delay_ms: u64,

    /// Show titles to drop before resolution, one per line, `#` comments.
    #[serde(default)]
    pub excluded_shows_file: Option<PathBuf>,

    /// `Title:id` map consulted before any metadata search.
    #[serde(default)]
    pub overrides_file: Option<PathBuf>,
}

fn default_dedup_window_days() -> i64 {
    3
}

fn default_order() -> String {
    "oldest".to_string()
}

fn default_write_delay_ms() -> u64 {
    500
}

impl Default for ImportDefaults {
    fn default() -> Self {
        Self {
            dedup_window_days: default_dedup_window_days(),
            order: default_order(),
            write_delay_ms: default_write_delay_ms(),
            excluded_shows_file: None,
            overrides_file: None,
        }
    }
}

impl Config {
    /// Load the config file, or defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load(Path::new("/nonexistent/config.toml")).unwrap();
        assert!(config.tmdb.is_none());
        assert_eq!(config.import.dedup_window_days, 3);
        assert_eq!(config.import.order, "oldest");
        assert_eq!(config.import.write_delay_ms, 500);
    }

    #[test]
    fn test_partial_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[tmdb]\napi_key = \"k\"\n\n[import]\ndedup_window_days = 7"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.tmdb.unwrap().api_key, "k");
        assert_eq!(config.import.dedup_window_days, 7);
        assert_eq!(config.import.write_delay_ms, 500);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not toml at all [").unwrap();
        assert!(Config::load(file.path()).is_err());
    }
}
