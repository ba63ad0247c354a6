//! YouTube and Google Sheets integration for playlistsheet.
//!
//! - [`PlaylistFetcher`](google::PlaylistFetcher) pages through
//!   `playlistItems.list` and normalizes items into [`Video`]s
//! - [`SheetBuilder`](google::SheetBuilder) creates, fills and formats a
//!   spreadsheet
//! - [`OAuthClient`](google::OAuthClient) signs the user in
//!
//! ```text
//!   playlist URL ──► PlaylistFetcher ──► [Video] ──► SheetBuilder ──► ConversionResult
//!                         │                               │
//!                   PlaylistItemsApi                  SheetsApi
//!                         │                               │
//!                   YouTubeClient                    SheetsClient
//! ```
//!
//! Remote failures surface as [`ProviderError`] with an
//! [`ErrorKind`](playlistsheet_core::ErrorKind) decided from the HTTP status
//! and Google's error reason.
//!
//! [`Video`]: playlistsheet_core::Video

pub mod api;
pub mod error;
pub mod google;

pub use api::{BoxFuture, PlaylistItemsApi, SheetsApi};
pub use error::{ProviderError, ProviderResult};
