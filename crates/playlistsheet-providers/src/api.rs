//! Remote API seams.
//!
//! The fetcher and the builder talk to Google through these two traits rather
//! than to the reqwest clients directly, so both can be driven by in-memory
//! stand-ins in tests. Each method is one remote call; pagination and step
//! sequencing live above this layer.

use std::future::Future;
use std::pin::Pin;

use crate::error::ProviderResult;
use crate::google::{BatchUpdateRequest, NewSpreadsheet, PlaylistItemListResponse, Spreadsheet, ValueRange};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the traits object-safe so they can be held as
/// `Arc<dyn ...>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The `playlistItems.list` endpoint.
pub trait PlaylistItemsApi: Send + Sync {
    /// Fetches one page of playlist items.
    ///
    /// `page_token` is `None` for the first page.
    fn list_playlist_items<'a>(
        &'a self,
        access_token: &'a str,
        playlist_id: &'a str,
        page_token: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<PlaylistItemListResponse>>;
}

/// The subset of the Sheets API used to build a spreadsheet.
pub trait SheetsApi: Send + Sync {
    /// `spreadsheets.create`
    fn create_spreadsheet<'a>(
        &'a self,
        access_token: &'a str,
        spreadsheet: &'a NewSpreadsheet,
    ) -> BoxFuture<'a, ProviderResult<Spreadsheet>>;

    /// `spreadsheets.values.update` with `valueInputOption=RAW`.
    fn update_values<'a>(
        &'a self,
        access_token: &'a str,
        spreadsheet_id: &'a str,
        values: &'a ValueRange,
    ) -> BoxFuture<'a, ProviderResult<()>>;

    /// `spreadsheets.batchUpdate`
    fn batch_update<'a>(
        &'a self,
        access_token: &'a str,
        spreadsheet_id: &'a str,
        request: &'a BatchUpdateRequest,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}
