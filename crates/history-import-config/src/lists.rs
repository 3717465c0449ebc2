use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::warn;

/// Parse a show-id override map: one `Title:id` per line. Blank lines
/// and `#` comments are ignored; a title may itself contain colons, so
/// the id is split off the last one.
pub fn parse_override_map(content: &str) -> HashMap<String, u32> {
    let mut overrides = HashMap::new();
    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((title, id_str)) = line.rsplit_once(':') else {
            warn!(line = line_num + 1, "Skipping override line without ':'");
            continue;
        };
        match id_str.trim().parse::<u32>() {
            Ok(id) => {
                overrides.insert(title.trim().to_string(), id);
            }
            Err(_) => {
                warn!(line = line_num + 1, id = id_str.trim(), "Skipping override with invalid id");
            }
        }
    }
    overrides
}

/// Parse an exclusion list: one show title per line, `#` comments and
/// blank lines ignored. Titles are lowercased because exclusion matches
/// case-insensitively.
pub fn parse_exclusion_list(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_lowercase())
        .collect()
}

pub fn read_override_file(path: &Path) -> Result<HashMap<String, u32>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read override file {}", path.display()))?;
    Ok(parse_override_map(&content))
}

pub fn read_exclusion_file(path: &Path) -> Result<HashSet<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exclusion file {}", path.display()))?;
    Ok(parse_exclusion_list(&content))
}
