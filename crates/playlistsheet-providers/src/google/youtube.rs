//! YouTube Data API v3 client.

use serde::Deserialize;
use tracing::debug;

use crate::api::{BoxFuture, PlaylistItemsApi};
use crate::error::ProviderResult;

use super::http;

/// Base URL for YouTube Data API v3.
pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Largest page size `playlistItems.list` accepts.
pub const MAX_PAGE_SIZE: u32 = 50;

/// YouTube Data API client.
///
/// Holds no credentials; the bearer token is supplied per call.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl YouTubeClient {
    /// Creates a client against the public API.
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url: YOUTUBE_API_BASE.to_string(),
        }
    }

    /// Points the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list_page(
        &self,
        access_token: &str,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> ProviderResult<PlaylistItemListResponse> {
        let url = format!("{}/playlistItems", self.base_url);
        let page_size = MAX_PAGE_SIZE.to_string();

        let mut request = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("part", "snippet"),
                ("playlistId", playlist_id),
                ("maxResults", page_size.as_str()),
            ]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = http::send(request, "playlistItems.list").await?;
        let page: PlaylistItemListResponse = http::read_json(response, "playlistItems.list").await?;

        debug!(
            playlist_id,
            items = page.items.len(),
            has_next = page.next_page_token.is_some(),
            "fetched playlist page"
        );
        Ok(page)
    }
}

impl PlaylistItemsApi for YouTubeClient {
    fn list_playlist_items<'a>(
        &'a self,
        access_token: &'a str,
        playlist_id: &'a str,
        page_token: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<PlaylistItemListResponse>> {
        Box::pin(self.list_page(access_token, playlist_id, page_token))
    }
}

/// Response from the playlistItems.list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemListResponse {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    pub next_page_token: Option<String>,
}

/// A single playlist entry as the API reports it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistItem {
    pub snippet: Option<PlaylistItemSnippet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    pub title: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<String>,
    pub resource_id: Option<ResourceId>,
    pub thumbnails: Option<ApiThumbnails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiThumbnails {
    pub default: Option<ApiThumbnail>,
    pub medium: Option<ApiThumbnail>,
    pub high: Option<ApiThumbnail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiThumbnail {
    #[serde(default)]
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_playlist_items_response() {
        let json = r#"{
            "kind": "youtube#playlistItemListResponse",
            "nextPageToken": "CAUQAA",
            "items": [
                {
                    "kind": "youtube#playlistItem",
                    "snippet": {
                        "publishedAt": "2024-03-15T10:00:00Z",
                        "title": "First video",
                        "description": "About the first video",
                        "thumbnails": {
                            "default": {"url": "https://i.ytimg.com/vi/abc/default.jpg", "width": 120},
                            "high": {"url": "https://i.ytimg.com/vi/abc/hqdefault.jpg"}
                        },
                        "resourceId": {"kind": "youtube#video", "videoId": "abc"}
                    }
                }
            ],
            "pageInfo": {"totalResults": 1, "resultsPerPage": 50}
        }"#;

        let response: PlaylistItemListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.next_page_token.as_deref(), Some("CAUQAA"));
        assert_eq!(response.items.len(), 1);

        let snippet = response.items[0].snippet.as_ref().unwrap();
        assert_eq!(snippet.title.as_deref(), Some("First video"));
        assert_eq!(
            snippet.resource_id.as_ref().unwrap().video_id.as_deref(),
            Some("abc")
        );
        let thumbnails = snippet.thumbnails.as_ref().unwrap();
        assert!(thumbnails.medium.is_none());
    }

    #[test]
    fn parse_empty_response() {
        let response: PlaylistItemListResponse = serde_json::from_str("{}").unwrap();
        assert!(response.items.is_empty());
        assert!(response.next_page_token.is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = YouTubeClient::new(reqwest::Client::new()).with_base_url("http://127.0.0.1:9/yt/");
        assert_eq!(client.base_url(), "http://127.0.0.1:9/yt");
    }
}
