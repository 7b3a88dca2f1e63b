//! YouTube Data API client for video and channel statistics.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::config::YoutubeConfig;
use crate::models::{ChannelStats, OutputRecord, VideoStats};
use crate::scrapers::http_client::USER_AGENT;

#[derive(Debug, thiserror::Error)]
pub enum YoutubeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YouTube API error {code}: {message}")]
    Api { code: u16, message: String },

    #[error("No YouTube API key (set YOUTUBE_API_KEY or pass --api-key)")]
    MissingKey,

    #[error("Failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// `list` responses share this envelope.
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: u16,
    #[serde(default)]
    message: String,
}

/// Extract the video id from a YouTube URL.
///
/// Handles `watch?v=`, `youtu.be/`, `/embed/`, `/v/` and `/shorts/` forms.
pub fn extract_video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.trim_start_matches("www.");
    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());

    let id = if host == "youtu.be" {
        segments.next()?.to_string()
    } else if host == "youtube.com" || host.ends_with(".youtube.com") {
        match segments.next()? {
            "watch" => parsed
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned())?,
            "embed" | "v" | "shorts" => segments.next()?.to_string(),
            _ => return None,
        }
    } else {
        return None;
    };

    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(id)
}

/// Video ids referenced by `records`, deduplicated in first-seen order.
///
/// Timestamps are scanned before resources within each record.
pub fn video_ids_from_records(records: &[OutputRecord]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for record in records {
        for url in record
            .timestamp_list()
            .into_iter()
            .chain(record.resource_list())
        {
            if let Some(id) = extract_video_id(&url) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
    }
    ids
}

/// Decode a `list` response body, returning its first item.
fn first_item<T: DeserializeOwned>(body: &str) -> Result<Option<T>, YoutubeError> {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return Err(YoutubeError::Api {
            code: envelope.error.code,
            message: envelope.error.message,
        });
    }
    let response: ListResponse<T> = serde_json::from_str(body)?;
    Ok(response.items.into_iter().next())
}

/// Decode a `list` response. A non-success status is always an error,
/// whatever the body holds.
fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<Option<T>, YoutubeError> {
    if status.is_success() {
        return first_item(body);
    }
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => Err(YoutubeError::Api {
            code: envelope.error.code,
            message: envelope.error.message,
        }),
        Err(_) => Err(YoutubeError::Api {
            code: status.as_u16(),
            message: body.to_string(),
        }),
    }
}

/// Client for the YouTube Data API v3.
pub struct YoutubeClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl YoutubeClient {
    /// Create a client. `api_key` takes precedence over the configured key.
    pub fn new(
        config: &YoutubeConfig,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, YoutubeError> {
        let api_key = api_key
            .or_else(|| config.api_key.clone())
            .filter(|k| !k.trim().is_empty())
            .ok_or(YoutubeError::MissingKey)?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Statistics for one video, or `None` if the id is unknown.
    pub async fn fetch_video_stats(
        &self,
        video_id: &str,
    ) -> Result<Option<VideoStats>, YoutubeError> {
        info!("Fetching stats for video {}", video_id);
        self.list(
            "videos",
            &[("part", "snippet,statistics,contentDetails"), ("id", video_id)],
        )
        .await
    }

    /// Statistics for the channel owned by `username`, or `None` if unknown.
    pub async fn fetch_channel_stats(
        &self,
        username: &str,
    ) -> Result<Option<ChannelStats>, YoutubeError> {
        info!("Fetching stats for channel {}", username);
        self.list(
            "channels",
            &[("part", "statistics,contentDetails"), ("forUsername", username)],
        )
        .await
    }

    async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<T>, YoutubeError> {
        let url = format!("{}/{}", self.api_base, resource);
        debug!("GET {} {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        decode_response(status, &body)
    }
}
