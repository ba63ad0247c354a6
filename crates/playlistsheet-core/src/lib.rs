//! Core types: videos, playlist references, error kinds, tracing

pub mod error;
pub mod playlist;
pub mod tracing;
pub mod video;

pub use error::ErrorKind;
pub use playlist::{InvalidReference, PLAYLIST_ID_PREFIXES, PlaylistId, extract_playlist_id};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use video::{
    ConversionResult, PlaylistPage, Thumbnails, Video, spreadsheet_url, watch_url,
};
