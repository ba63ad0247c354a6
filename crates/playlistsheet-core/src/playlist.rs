//! Playlist reference extraction.
//!
//! Users paste either a full playlist URL or a bare playlist ID. Anything
//! parseable as a URL wins if it carries a `list` query parameter; otherwise
//! the raw string is accepted only when it looks like a playlist ID.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

/// Prefixes YouTube uses for playlist IDs (user playlists, uploads,
/// favourites, mixes).
pub const PLAYLIST_ID_PREFIXES: [&str; 4] = ["PL", "UU", "FL", "RD"];

/// A playlist reference that could not be resolved to a playlist ID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unable to extract a playlist ID from {input:?}")]
pub struct InvalidReference {
    input: String,
}

impl InvalidReference {
    /// The rejected input, trimmed.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// A YouTube playlist identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaylistId(String);

impl PlaylistId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PlaylistId {
    type Err = InvalidReference;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        extract_playlist_id(s)
    }
}

impl AsRef<str> for PlaylistId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolves a user-supplied playlist reference to a playlist ID.
///
/// ```
/// use playlistsheet_core::extract_playlist_id;
///
/// let id = extract_playlist_id("https://www.youtube.com/playlist?list=PLxyz").unwrap();
/// assert_eq!(id.as_str(), "PLxyz");
/// assert!(extract_playlist_id("https://youtube.com/watch?v=abc").is_err());
/// ```
pub fn extract_playlist_id(input: &str) -> Result<PlaylistId, InvalidReference> {
    let trimmed = input.trim();

    if let Ok(url) = Url::parse(trimmed)
        && let Some((_, list)) = url.query_pairs().find(|(key, _)| key == "list")
        && !list.trim().is_empty()
    {
        return Ok(PlaylistId(list.trim().to_string()));
    }

    if PLAYLIST_ID_PREFIXES
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
    {
        return Ok(PlaylistId(trimmed.to_string()));
    }

    Err(InvalidReference {
        input: trimmed.to_string(),
    })
}
