use crate::error::RemoteError;
use crate::serializd::api;
use crate::traits::TrackingService;
use async_trait::async_trait;
use history_import_models::{CanonicalEpisode, ExistingLogEntry, NewLogEntry};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{info, warn};

/// Authenticated Serializd diary client.
///
/// Holds two request-saving caches: the season-id map (season numbers
/// are stable per show) and the user's full review list, which the
/// service only exposes as one collection. The review cache is
/// invalidated after every write so subsequent reads observe it.
pub struct SerializdClient {
    client: Client,
    token: Option<String>,
    season_cache: Mutex<HashMap<(u32, u32), u32>>,
    reviews_cache: Mutex<Option<Vec<api::DiaryEntry>>>,
}

impl SerializdClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            token: None,
            season_cache: Mutex::new(HashMap::new()),
            reviews_cache: Mutex::new(None),
        }
    }

    /// Authenticate against the service, preferring a saved session
    /// token over a fresh login.
    pub async fn authenticate(
        &mut self,
        saved_token: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), RemoteError> {
        if let Some(token) = saved_token {
            // Validate the token with the one call every run needs
            // anyway; success warms the review cache.
            match api::get_user_reviews(&self.client, token).await {
                Ok(reviews) => {
                    *self.reviews_cache.lock().unwrap() = Some(reviews);
                    self.token = Some(token.to_string());
                    info!("Using saved Serializd session token");
                    return Ok(());
                }
                Err(e) => {
                    info!("Saved Serializd token appears invalid ({}), logging in again", e);
                }
            }
        }

        let (email, password) = match (email, password) {
            (Some(email), Some(password)) => (email, password),
            _ => {
                return Err(RemoteError::Auth(
                    "no Serializd credentials configured (set SERIALIZD_EMAIL and \
                     SERIALIZD_PASSWORD, or run with a saved session token)"
                        .to_string(),
                ))
            }
        };

        let token = api::login(&self.client, email, password).await?;
        self.token = Some(token);
        info!("Authenticated to Serializd");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Session token for the credential store to persist.
    pub fn session_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn access_token(&self) -> Result<&str, RemoteError> {
        self.token
            .as_deref()
            .ok_or_else(|| RemoteError::Auth("not authenticated".to_string()))
    }

    async fn resolve_season_id(&self, show_id: u32, season_number: u32) -> Result<u32, RemoteError> {
        if let Some(&id) = self.season_cache.lock().unwrap().get(&(show_id, season_number)) {
            return Ok(id);
        }

        let token = self.access_token()?;
        let show = api::get_show(&self.client, token, show_id).await?;
        let mut cache = self.season_cache.lock().unwrap();
        for season in &show.seasons {
            cache.insert((show_id, season.season_number), season.id);
        }
        cache
            .get(&(show_id, season_number))
            .copied()
            .ok_or_else(|| {
                RemoteError::NotFound(format!(
                    "season {} not found for show {}",
                    season_number, show_id
                ))
            })
    }

    async fn cached_reviews(&self) -> Result<Vec<api::DiaryEntry>, RemoteError> {
        if let Some(reviews) = self.reviews_cache.lock().unwrap().as_ref() {
            return Ok(reviews.clone());
        }
        let token = self.access_token()?;
        let reviews = api::get_user_reviews(&self.client, token).await?;
        *self.reviews_cache.lock().unwrap() = Some(reviews.clone());
        Ok(reviews)
    }

    fn invalidate_reviews_cache(&self) {
        *self.reviews_cache.lock().unwrap() = None;
    }

    async fn log_entry(
        &self,
        episode: &CanonicalEpisode,
        entry: &NewLogEntry,
        mark_as_watched: bool,
    ) -> Result<ExistingLogEntry, RemoteError> {
        let season_id = self.resolve_season_id(episode.show_id, episode.season).await?;
        let token = self.access_token()?;

        let request = api::LogEpisodeRequest {
            show_id: episode.show_id,
            season_id,
            episode_number: episode.episode,
            watched_at: entry.watched_at.to_rfc3339(),
            review_text: entry.review.clone(),
            tags: entry.tags.clone(),
            mark_as_watched,
        };
        let id = api::log_episode_to_diary(&self.client, token, &request).await?;
        self.invalidate_reviews_cache();

        Ok(ExistingLogEntry {
            id,
            watched_at: Some(entry.watched_at),
            has_review: entry
                .review
                .as_deref()
                .map(|r| !r.trim().is_empty())
                .unwrap_or(false),
        })
    }
}

impl Default for SerializdClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrackingService for SerializdClient {
    async fn existing_entries(
        &self,
        episode: &CanonicalEpisode,
    ) -> Result<Vec<ExistingLogEntry>, RemoteError> {
        // Season id is the service's own notion of identity; entries
        // are matched on (show, season id, episode number).
        let season_id = self.resolve_season_id(episode.show_id, episode.season).await?;
        let reviews = self.cached_reviews().await?;

        Ok(reviews
            .iter()
            .filter(|r| {
                r.show_id == episode.show_id
                    && r.season_id == season_id
                    && r.episode_number == episode.episode
            })
            .map(|r| ExistingLogEntry {
                id: r.id,
                watched_at: r.backdate_parsed(),
                has_review: r.has_review_text(),
            })
            .collect())
    }

    async fn create_entry(
        &self,
        episode: &CanonicalEpisode,
        entry: &NewLogEntry,
    ) -> Result<ExistingLogEntry, RemoteError> {
        self.log_entry(episode, entry, true).await
    }

    async fn add_entry_alongside(
        &self,
        episode: &CanonicalEpisode,
        entry: &NewLogEntry,
    ) -> Result<ExistingLogEntry, RemoteError> {
        // Not marked as watched: the existing entry already did that,
        // this one only adds the extra diary line.
        self.log_entry(episode, entry, false).await
    }

    async fn delete_entry(&self, entry_id: u64) -> Result<(), RemoteError> {
        let token = self.access_token()?;
        api::delete_diary_entry(&self.client, token, entry_id).await?;
        self.invalidate_reviews_cache();
        Ok(())
    }

    async fn delete_entries_by_tag(&self, tag: Option<&str>) -> Result<usize, RemoteError> {
        let reviews = self.cached_reviews().await?;
        let matching: Vec<&api::DiaryEntry> = match tag {
            Some(tag) => reviews.iter().filter(|r| has_tag(&r.tags, tag)).collect(),
            None => reviews.iter().collect(),
        };

        let token = self.access_token()?;
        let mut deleted = 0;
        for entry in matching {
            match api::delete_diary_entry(&self.client, token, entry.id).await {
                Ok(()) => deleted += 1,
                Err(e) => warn!(entry_id = entry.id, error = %e, "Failed to delete entry"),
            }
        }
        self.invalidate_reviews_cache();
        Ok(deleted)
    }
}

/// Tags are stored with or without a leading '#'; match both spellings.
fn has_tag(tags: &[String], wanted: &str) -> bool {
    let wanted = wanted.trim_start_matches('#');
    tags.iter()
        .any(|t| t.trim_start_matches('#').eq_ignore_ascii_case(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_tag_hash_insensitive() {
        let tags = vec!["#netfliximport".to_string(), "favorites".to_string()];
        assert!(has_tag(&tags, "netfliximport"));
        assert!(has_tag(&tags, "#netfliximport"));
        assert!(has_tag(&tags, "#favorites"));
        assert!(!has_tag(&tags, "pleximport"));
    }
}
