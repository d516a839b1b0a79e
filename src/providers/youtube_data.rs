use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::MetadataConfig;
use crate::error::ProviderError;
use crate::model::VideoMetadata;
use crate::providers::backend::MetadataProvider;

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    snippet: Snippet,
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    channel_id: String,
    channel_title: String,
    published_at: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

/// Video metadata from the YouTube Data API v3 `videos` endpoint.
pub struct YouTubeDataApi {
    api_base: String,
    api_key: String,
    client: Client,
}

impl std::fmt::Debug for YouTubeDataApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTubeDataApi")
            .field("api_base", &self.api_base)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl YouTubeDataApi {
    pub fn new(config: &MetadataConfig, api_key: String) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }
}

impl MetadataProvider for YouTubeDataApi {
    fn name(&self) -> &str {
        "youtube-data-api"
    }

    fn get_video(&self, video_id: &str) -> Result<Option<VideoMetadata>, ProviderError> {
        let url = format!("{}/videos", self.api_base);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("part", "snippet,contentDetails"),
                ("id", video_id),
                ("key", self.api_key.as_str()),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(ProviderError::Unexpected(format!(
                "YouTube Data API returned HTTP {}: {}",
                status.as_u16(),
                error_body
            )));
        }

        let list: VideoListResponse = response.json()?;
        Ok(first_video(list))
    }
}

fn first_video(list: VideoListResponse) -> Option<VideoMetadata> {
    list.items.into_iter().next().map(|item| VideoMetadata {
        title: item.snippet.title,
        channel_id: item.snippet.channel_id,
        channel_title: item.snippet.channel_title,
        published_at: item.snippet.published_at,
        duration_iso8601: item.content_details.duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_video_maps_snippet_and_duration() {
        let list: VideoListResponse = serde_json::from_value(serde_json::json!({
            "kind": "youtube#videoListResponse",
            "items": [{
                "id": "abc",
                "snippet": {
                    "title": "Talk",
                    "channelId": "UC42",
                    "channelTitle": "Conf",
                    "publishedAt": "2023-05-06T07:08:09Z",
                    "defaultAudioLanguage": "de"
                },
                "contentDetails": { "duration": "PT1M30.9S" }
            }]
        }))
        .unwrap();

        let video = first_video(list).unwrap();
        assert_eq!(video.title, "Talk");
        assert_eq!(video.channel_id, "UC42");
        assert_eq!(video.channel_title, "Conf");
        assert_eq!(video.published_at, "2023-05-06T07:08:09Z");
        assert_eq!(video.duration_iso8601, "PT1M30.9S");
    }

    #[test]
    fn test_first_video_empty_items_is_none() {
        let list: VideoListResponse =
            serde_json::from_value(serde_json::json!({ "items": [] })).unwrap();
        assert!(first_video(list).is_none());

        let list: VideoListResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(first_video(list).is_none());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let api = YouTubeDataApi::new(&MetadataConfig::default(), "secret-123".to_string()).unwrap();
        let debug_output = format!("{:?}", api);
        assert!(!debug_output.contains("secret-123"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
