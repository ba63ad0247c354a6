//! Video and conversion result types.
//!
//! These are the values that flow through the pipeline: the fetcher produces
//! [`Video`]s page by page, the builder consumes them, and a successful run
//! ends with a [`ConversionResult`]. All of them serialize with camelCase
//! field names so they can cross the HTTP boundary unchanged.

use serde::{Deserialize, Serialize};

/// Base of the canonical watch URL.
const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

/// Base of the spreadsheet edit URL.
const SPREADSHEET_URL_BASE: &str = "https://docs.google.com/spreadsheets/d/";

/// Returns the canonical watch URL for a video ID.
pub fn watch_url(video_id: &str) -> String {
    format!("{}{}", WATCH_URL_BASE, video_id)
}

/// Returns the edit URL for a spreadsheet ID.
pub fn spreadsheet_url(spreadsheet_id: &str) -> String {
    format!("{}{}/edit", SPREADSHEET_URL_BASE, spreadsheet_id)
}

/// Thumbnail URLs in the three sizes the listing API reports.
///
/// A size the API did not report is an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnails {
    #[serde(default)]
    pub default: String,
    #[serde(default)]
    pub medium: String,
    #[serde(default)]
    pub high: String,
}

/// A single playlist entry.
///
/// Identity is the video `id`; the `url` is always derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Thumbnails>,
}

impl Video {
    /// Creates a video with its canonical watch URL.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            url: watch_url(&id),
            id,
            title: title.into(),
            description: None,
            published_at: None,
            thumbnails: None,
        }
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the publication timestamp (RFC 3339, as reported).
    pub fn with_published_at(mut self, published_at: impl Into<String>) -> Self {
        self.published_at = Some(published_at.into());
        self
    }

    /// Builder method to set thumbnails.
    pub fn with_thumbnails(mut self, thumbnails: Thumbnails) -> Self {
        self.thumbnails = Some(thumbnails);
        self
    }

    /// The `(title, url)` pair written to the spreadsheet.
    pub fn as_row(&self) -> [String; 2] {
        [self.title.clone(), self.url.clone()]
    }
}

/// One page of a paginated playlist listing, already normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistPage {
    pub items: Vec<Video>,
    pub next_page_token: Option<String>,
}

impl PlaylistPage {
    /// Returns the continuation token if more pages remain.
    ///
    /// An empty token is treated the same as an absent one.
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub spreadsheet_id: String,
    pub spreadsheet_url: String,
    pub video_count: usize,
}

impl ConversionResult {
    /// Creates a result, deriving the edit URL from the spreadsheet ID.
    pub fn new(spreadsheet_id: impl Into<String>, video_count: usize) -> Self {
        let spreadsheet_id = spreadsheet_id.into();
        Self {
            spreadsheet_url: spreadsheet_url(&spreadsheet_id),
            spreadsheet_id,
            video_count,
        }
    }
}
