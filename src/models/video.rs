//! Typed views of YouTube Data API v3 resources.
//!
//! Only the parts podnotes reads are modeled; unknown fields are ignored.
//! The API encodes counts as decimal strings, so they are parsed here.

use serde::{Deserialize, Deserializer, Serialize};

fn de_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Text(String),
        Number(u64),
    }

    match Option::<Count>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Count::Number(n)) => Ok(Some(n)),
        Some(Count::Text(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub channel_title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    #[serde(default, deserialize_with = "de_count")]
    pub view_count: Option<u64>,
    #[serde(default, deserialize_with = "de_count")]
    pub like_count: Option<u64>,
    #[serde(default, deserialize_with = "de_count")]
    pub comment_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoContentDetails {
    /// ISO 8601 duration, e.g. `PT2H14M3S`.
    #[serde(default)]
    pub duration: Option<String>,
}

/// Statistics for a single video (`videos.list` item).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStats {
    pub id: String,
    #[serde(default)]
    pub snippet: Snippet,
    #[serde(default)]
    pub statistics: VideoStatistics,
    #[serde(default)]
    pub content_details: VideoContentDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    #[serde(default, deserialize_with = "de_count")]
    pub view_count: Option<u64>,
    #[serde(default, deserialize_with = "de_count")]
    pub subscriber_count: Option<u64>,
    #[serde(default, deserialize_with = "de_count")]
    pub video_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedPlaylists {
    #[serde(default)]
    pub uploads: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContentDetails {
    #[serde(default)]
    pub related_playlists: RelatedPlaylists,
}

/// Statistics for a channel (`channels.list` item).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub id: String,
    #[serde(default)]
    pub statistics: ChannelStatistics,
    #[serde(default)]
    pub content_details: ChannelContentDetails,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_stats_from_api_item() {
        let json = r#"{
            "kind": "youtube#video",
            "id": "SwSbnmqk3zY",
            "snippet": {"title": "Episode", "publishedAt": "2024-03-01T12:00:00Z"},
            "statistics": {"viewCount": "1234", "likeCount": "56", "favoriteCount": "0"},
            "contentDetails": {"duration": "PT2H3M"}
        }"#;
        let stats: VideoStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.id, "SwSbnmqk3zY");
        assert_eq!(stats.snippet.title.as_deref(), Some("Episode"));
        assert_eq!(stats.statistics.view_count, Some(1234));
        assert_eq!(stats.statistics.like_count, Some(56));
        assert_eq!(stats.statistics.comment_count, None);
        assert_eq!(stats.content_details.duration.as_deref(), Some("PT2H3M"));
    }

    #[test]
    fn test_channel_stats_from_api_item() {
        let json = r#"{
            "id": "UC123",
            "statistics": {"viewCount": "10", "subscriberCount": "20", "videoCount": 3},
            "contentDetails": {"relatedPlaylists": {"uploads": "UU123"}}
        }"#;
        let stats: ChannelStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.statistics.subscriber_count, Some(20));
        assert_eq!(stats.statistics.video_count, Some(3));
        assert_eq!(
            stats.content_details.related_playlists.uploads.as_deref(),
            Some("UU123")
        );
    }

    #[test]
    fn test_bad_count_is_an_error() {
        let json = r#"{"id": "x", "statistics": {"viewCount": "lots"}}"#;
        assert!(serde_json::from_str::<VideoStats>(json).is_err());
    }
}
