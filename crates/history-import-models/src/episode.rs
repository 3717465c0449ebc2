use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity key for dedup and merge decisions: the resolved external
/// (TMDB) show id plus season and episode numbers. Two events for the
/// same broadcast episode always map to the same `CanonicalEpisode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalEpisode {
    pub show_id: u32,
    pub season: u32,
    pub episode: u32,
}

impl CanonicalEpisode {
    pub fn new(show_id: u32, season: u32, episode: u32) -> Self {
        Self {
            show_id,
            season,
            episode,
        }
    }
}

impl fmt::Display for CanonicalEpisode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/S{:02}E{:02}", self.show_id, self.season, self.episode)
    }
}
