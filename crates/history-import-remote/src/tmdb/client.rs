use crate::error::RemoteError;
use crate::traits::{MetadataLookup, ShowCandidate};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const BASE_URL: &str = "https://api.themoviedb.org/3";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: u32,
    name: String,
    #[serde(default)]
    popularity: f64,
}

/// TMDB TV-search client. Only the title-search endpoint is used; the
/// pipeline never needs full show metadata.
#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
}

impl TmdbClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    pub async fn search_shows(&self, query: &str) -> Result<Vec<ShowCandidate>, RemoteError> {
        let url = format!(
            "{}/search/tv?api_key={}&query={}",
            BASE_URL,
            self.api_key,
            urlencoding::encode(query)
        );

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api { status, message });
        }

        let parsed: SearchResponse = response.json().await?;
        debug!(query, candidates = parsed.results.len(), "TMDB search");

        Ok(parsed
            .results
            .into_iter()
            .map(|r| ShowCandidate {
                id: r.id,
                name: r.name,
                relevance: r.popularity,
            })
            .collect())
    }
}

#[async_trait]
impl MetadataLookup for TmdbClient {
    async fn search(&self, title: &str) -> Result<Vec<ShowCandidate>, RemoteError> {
        self.search_shows(title).await
    }
}
