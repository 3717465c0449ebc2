use crate::error::RemoteError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

const BASE_URL: &str = "https://www.serializd.com/api";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
pub struct ShowResponse {
    #[serde(default)]
    pub seasons: Vec<SeasonInfo>,
}

#[derive(Debug, Deserialize)]
pub struct SeasonInfo {
    pub id: u32,
    #[serde(rename = "seasonNumber")]
    pub season_number: u32,
}

/// One diary entry as the service returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct DiaryEntry {
    pub id: u64,
    #[serde(rename = "showId")]
    pub show_id: u32,
    #[serde(rename = "seasonId")]
    pub season_id: u32,
    #[serde(rename = "episodeNumber")]
    pub episode_number: u32,
    /// ISO timestamp of the logged watch date; absent on undated stubs.
    #[serde(default)]
    pub backdate: Option<String>,
    #[serde(rename = "reviewText", default)]
    pub review_text: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl DiaryEntry {
    pub fn has_review_text(&self) -> bool {
        self.review_text
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn backdate_parsed(&self) -> Option<DateTime<Utc>> {
        parse_backdate(self.backdate.as_deref()?)
    }
}

#[derive(Debug, Serialize)]
pub struct LogEpisodeRequest {
    #[serde(rename = "showId")]
    pub show_id: u32,
    #[serde(rename = "seasonId")]
    pub season_id: u32,
    #[serde(rename = "episodeNumber")]
    pub episode_number: u32,
    #[serde(rename = "backdate")]
    pub watched_at: String,
    #[serde(rename = "reviewText", skip_serializing_if = "Option::is_none")]
    pub review_text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(rename = "markAsWatched")]
    pub mark_as_watched: bool,
}

#[derive(Debug, Deserialize)]
struct LogEpisodeResponse {
    id: u64,
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    Err(RemoteError::Api { status, message })
}

/// Exchange email/password for a session token.
pub async fn login(client: &Client, email: &str, password: &str) -> Result<String, RemoteError> {
    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;

    if response.status().as_u16() == 401 {
        return Err(RemoteError::Auth("invalid email or password".to_string()));
    }
    let response = check(response).await?;
    let parsed: LoginResponse = response.json().await?;
    Ok(parsed.token)
}

/// Fetch a show, including its season list (needed to map a season
/// number to the service's season id).
pub async fn get_show(client: &Client, token: &str, show_id: u32) -> Result<ShowResponse, RemoteError> {
    let response = client
        .get(format!("{}/show/{}", BASE_URL, show_id))
        .header("Authorization", format!("Bearer {}", token))
        .header("Accept", "application/json")
        .send()
        .await?;
    let response = check(response).await?;
    Ok(response.json().await?)
}

/// All diary entries of the authenticated user.
pub async fn get_user_reviews(client: &Client, token: &str) -> Result<Vec<DiaryEntry>, RemoteError> {
    let response = client
        .get(format!("{}/user/reviews", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .header("Accept", "application/json")
        .send()
        .await?;
    let response = check(response).await?;
    Ok(response.json().await?)
}

/// Write one diary entry; returns the id the service assigned.
pub async fn log_episode_to_diary(
    client: &Client,
    token: &str,
    request: &LogEpisodeRequest,
) -> Result<u64, RemoteError> {
    let response = client
        .post(format!("{}/diary/log_episode", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(request)
        .send()
        .await?;
    let response = check(response).await?;
    let parsed: LogEpisodeResponse = response.json().await?;
    Ok(parsed.id)
}

pub async fn delete_diary_entry(client: &Client, token: &str, entry_id: u64) -> Result<(), RemoteError> {
    let response = client
        .delete(format!("{}/diary/{}", BASE_URL, entry_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;
    check(response).await?;
    Ok(())
}

/// The service writes RFC 3339 with a trailing Z; older entries can be
/// a bare timestamp or date.
fn parse_backdate(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backdate_variants() {
        for raw in [
            "2024-01-15T00:00:00Z",
            "2024-01-15T00:00:00+00:00",
            "2024-01-15T00:00:00",
            "2024-01-15",
        ] {
            let parsed = parse_backdate(raw).unwrap();
            assert_eq!(parsed.date_naive().to_string(), "2024-01-15", "input {}", raw);
        }
        assert_eq!(parse_backdate("not a date"), None);
    }

    #[test]
    fn test_has_review_text_ignores_whitespace() {
        let mut entry = DiaryEntry {
            id: 1,
            show_id: 1,
            season_id: 1,
            episode_number: 1,
            backdate: None,
            review_text: Some("   ".to_string()),
            tags: Vec::new(),
        };
        assert!(!entry.has_review_text());
        entry.review_text = Some("great finale".to_string());
        assert!(entry.has_review_text());
    }
}
