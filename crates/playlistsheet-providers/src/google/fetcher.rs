//! Paginated playlist retrieval.

use std::collections::HashSet;
use std::sync::Arc;

use playlistsheet_core::{PlaylistId, PlaylistPage, Thumbnails, Video, extract_playlist_id};
use tracing::{info, instrument, warn};

use crate::api::PlaylistItemsApi;
use crate::error::{ProviderError, ProviderResult};

use super::youtube::{ApiThumbnail, ApiThumbnails, PlaylistItem, PlaylistItemListResponse};

/// Walks every page of a playlist and flattens it into an ordered video list.
#[derive(Clone)]
pub struct PlaylistFetcher {
    api: Arc<dyn PlaylistItemsApi>,
}

impl PlaylistFetcher {
    pub fn new(api: Arc<dyn PlaylistItemsApi>) -> Self {
        Self { api }
    }

    /// Resolves a playlist URL or bare ID and fetches all its videos.
    ///
    /// An unresolvable reference fails with a validation error before any
    /// remote call.
    pub async fn fetch_reference(
        &self,
        access_token: &str,
        reference: &str,
    ) -> ProviderResult<Vec<Video>> {
        let playlist = extract_playlist_id(reference).map_err(|e| {
            ProviderError::validation("Invalid YouTube playlist URL").with_source(e)
        })?;
        self.fetch_all(access_token, &playlist).await
    }

    /// Fetches every video of a playlist, following continuation tokens.
    ///
    /// Items without a title or video ID are dropped. An empty playlist is a
    /// valid result. Pagination stops at the first token already requested.
    #[instrument(skip_all, fields(playlist = %playlist))]
    pub async fn fetch_all(
        &self,
        access_token: &str,
        playlist: &PlaylistId,
    ) -> ProviderResult<Vec<Video>> {
        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut pages = 0usize;

        loop {
            let page = self
                .fetch_page(access_token, playlist, page_token.as_deref())
                .await?;
            pages += 1;
            let next = page.continuation().map(String::from);
            videos.extend(page.items);

            match next {
                Some(next) if !seen_tokens.insert(next.clone()) => {
                    warn!(token = %next, "continuation token repeated, stopping");
                    break;
                }
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        info!(videos = videos.len(), pages, "fetched playlist");
        Ok(videos)
    }

    /// Fetches and normalizes a single page.
    pub async fn fetch_page(
        &self,
        access_token: &str,
        playlist: &PlaylistId,
        page_token: Option<&str>,
    ) -> ProviderResult<PlaylistPage> {
        let response = self
            .api
            .list_playlist_items(access_token, playlist.as_str(), page_token)
            .await?;
        Ok(normalize_page(response))
    }
}

impl std::fmt::Debug for PlaylistFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaylistFetcher").finish_non_exhaustive()
    }
}

/// Normalizes a raw API page, dropping unusable items.
pub fn normalize_page(response: PlaylistItemListResponse) -> PlaylistPage {
    PlaylistPage {
        items: response.items.into_iter().filter_map(normalize_item).collect(),
        next_page_token: response.next_page_token,
    }
}

/// Converts a raw playlist item into a [`Video`].
///
/// Returns `None` when the title or video ID is missing or empty (deleted and
/// private videos show up this way).
pub fn normalize_item(item: PlaylistItem) -> Option<Video> {
    let snippet = item.snippet?;
    let title = snippet.title.filter(|t| !t.is_empty())?;
    let video_id = snippet
        .resource_id
        .and_then(|r| r.video_id)
        .filter(|id| !id.is_empty())?;

    let mut video = Video::new(video_id, title);
    if let Some(description) = snippet.description.filter(|d| !d.is_empty()) {
        video = video.with_description(description);
    }
    if let Some(published_at) = snippet.published_at.filter(|p| !p.is_empty()) {
        video = video.with_published_at(published_at);
    }
    if let Some(thumbnails) = snippet.thumbnails {
        video = video.with_thumbnails(convert_thumbnails(thumbnails));
    }
    Some(video)
}

fn convert_thumbnails(thumbnails: ApiThumbnails) -> Thumbnails {
    let url = |t: Option<ApiThumbnail>| t.map(|t| t.url).unwrap_or_default();
    Thumbnails {
        default: url(thumbnails.default),
        medium: url(thumbnails.medium),
        high: url(thumbnails.high),
    }
}
