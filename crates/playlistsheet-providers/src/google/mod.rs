//! Google API integration: YouTube playlist retrieval, spreadsheet building
//! and OAuth sign-in.
//!
//! # Example
//!
//! ```ignore
//! use playlistsheet_providers::google::{ApiEndpoints, GoogleServices};
//!
//! let services = GoogleServices::new(&ApiEndpoints::default())?;
//! let videos = services.fetcher.fetch_reference(&token, "PLxyz").await?;
//! let result = services.builder.build(&token, &videos, "Road trip").await?;
//! println!("{}", result.spreadsheet_url);
//! ```

mod builder;
mod config;
mod fetcher;
mod http;
mod oauth;
mod sheets;
mod youtube;

use std::sync::Arc;

pub use builder::{
    BuildStep, HEADER_ROW, SheetBuilder, WORKSHEET_TITLE, header_format_requests,
    spreadsheet_title, value_range,
};
pub use config::{
    ApiEndpoints, DEFAULT_TIMEOUT_SECS, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GoogleConfig,
    OAuthCredentials, SPREADSHEETS_SCOPE, YOUTUBE_READONLY_SCOPE, default_scopes,
};
pub use fetcher::{PlaylistFetcher, normalize_item, normalize_page};
pub use http::{build_http_client, classify};
pub use oauth::{GrantedToken, OAuthClient, PkceFlow};
pub use sheets::{
    AutoResizeDimensionsRequest, BatchUpdateRequest, CellData, CellFormat, Color, DimensionRange,
    GridProperties, GridRange, NewSpreadsheet, RepeatCellRequest, SHEETS_API_BASE, Sheet,
    SheetProperties, SheetRequest, SheetsClient, Spreadsheet, SpreadsheetProperties, TextFormat,
    ValueRange,
};
pub use youtube::{
    ApiThumbnail, ApiThumbnails, MAX_PAGE_SIZE, PlaylistItem, PlaylistItemListResponse,
    PlaylistItemSnippet, ResourceId, YOUTUBE_API_BASE, YouTubeClient,
};

use crate::error::ProviderResult;

/// A fetcher and a builder wired to the real Google clients.
#[derive(Debug, Clone)]
pub struct GoogleServices {
    pub fetcher: PlaylistFetcher,
    pub builder: SheetBuilder,
}

impl GoogleServices {
    /// Builds both clients over one shared HTTP connection pool.
    pub fn new(endpoints: &ApiEndpoints) -> ProviderResult<Self> {
        let http_client = build_http_client(endpoints.timeout, &endpoints.user_agent)?;

        let youtube = YouTubeClient::new(http_client.clone()).with_base_url(&endpoints.youtube_base);
        let sheets = SheetsClient::new(http_client).with_base_url(&endpoints.sheets_base);

        Ok(Self {
            fetcher: PlaylistFetcher::new(Arc::new(youtube)),
            builder: SheetBuilder::new(Arc::new(sheets)),
        })
    }
}
