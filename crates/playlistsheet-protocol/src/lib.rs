//! HTTP envelopes and request schemas for playlistsheet.
//!
//! Both endpoints speak JSON over `POST`:
//!
//! | Path                       | Request                 | Success data          |
//! |----------------------------|-------------------------|-----------------------|
//! | [`FETCH_PLAYLIST_PATH`]    | [`FetchPlaylistRequest`] | [`FetchPlaylistData`] |
//! | [`CREATE_SHEET_PATH`]      | [`CreateSheetRequest`]   | `ConversionResult`    |
//!
//! Successful responses are wrapped in a [`SuccessEnvelope`], failures in an
//! [`ErrorEnvelope`] whose HTTP status follows its [`ErrorKind`].
//!
//! # Example
//!
//! ```rust
//! use playlistsheet_protocol::{FetchPlaylistRequest, decode_request};
//!
//! let body = br#"{"playlistUrl":"PLxyz","accessToken":"ya29.token"}"#;
//! let request: FetchPlaylistRequest = decode_request(body).unwrap();
//! assert_eq!(request.playlist_url, "PLxyz");
//! ```
//!
//! [`ErrorKind`]: playlistsheet_core::ErrorKind

mod error;
mod types;
mod validate;

pub use error::{ProtocolError, ProtocolResult};
pub use types::{
    CreateSheetRequest, ErrorEnvelope, FetchPlaylistData, FetchPlaylistRequest, SuccessEnvelope,
};
pub use validate::{RequestSchema, decode_request, missing_fields};

/// Path of the playlist fetch endpoint.
pub const FETCH_PLAYLIST_PATH: &str = "/api/youtube/playlist";

/// Path of the spreadsheet creation endpoint.
pub const CREATE_SHEET_PATH: &str = "/api/sheets/create";

/// Maximum accepted request body size (4 MB).
pub const MAX_BODY_SIZE: usize = 4 * 1024 * 1024;
