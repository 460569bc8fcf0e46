// ABOUTME: YouTube Data API v3 client for related-video search
// ABOUTME: Best-effort enrichment; callers treat failures as empty results
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! YouTube video search
//!
//! Wraps the Data API v3 `search.list` endpoint. The normalizer calls this
//! with the dish name and tolerates any failure, so this client never needs
//! retries.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::VideoSearch;
use crate::errors::AppError;
use crate::models::Video;

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";

/// YouTube Data API search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(rename = "channelTitle", default)]
    channel_title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "publishedAt", default)]
    published_at: String,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl Thumbnails {
    fn best_url(&self) -> String {
        self.high
            .as_ref()
            .or(self.medium.as_ref())
            .or(self.default.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_default()
    }
}

/// YouTube Data API v3 client
pub struct YouTubeClient {
    api_key: String,
    client: Client,
}

impl YouTubeClient {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Video>, AppError> {
        let search_query = format!("{query} recipe");
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", &limit.to_string()),
                ("q", &search_query),
                ("key", &self.api_key),
            ])
            .send()
            .await
            .map_err(|e| AppError::external_service("youtube", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(
                "youtube",
                format!("search failed with status {status}: {body}"),
            ));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::external_service("youtube", e.to_string()))?;

        let videos: Vec<Video> = parsed
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                Some(Video {
                    video_id,
                    title: item.snippet.title,
                    channel_title: item.snippet.channel_title,
                    description: item.snippet.description,
                    published_at: item.snippet.published_at,
                    thumbnail_url: item
                        .snippet
                        .thumbnails
                        .as_ref()
                        .map(Thumbnails::best_url)
                        .unwrap_or_default(),
                })
            })
            .take(limit)
            .collect();

        debug!(count = videos.len(), "youtube search returned videos");
        Ok(videos)
    }
}

/// Stand-in used when no YouTube API key is configured
///
/// Always returns zero results, which the enrichment path treats the same
/// as a search that found nothing.
pub struct DisabledVideoSearch;

#[async_trait]
impl VideoSearch for DisabledVideoSearch {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<Video>, AppError> {
        Ok(Vec::new())
    }
}
