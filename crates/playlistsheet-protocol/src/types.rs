//! Request and response types for the HTTP endpoints.

use std::fmt;

use playlistsheet_core::{ErrorKind, Video};
use serde::{Deserialize, Serialize};

/// Wrapper for every successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    /// Always `true`.
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> SuccessEnvelope<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

fn default_kind() -> ErrorKind {
    ErrorKind::Upstream
}

/// Wrapper for every failed response.
///
/// `error` is a short label, `message` the longer human-readable explanation.
/// Neither ever contains the caller's access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Always `false`.
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(default = "default_kind")]
    pub kind: ErrorKind,
    /// Field names that failed presence validation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
    /// Spreadsheet left behind by a partial failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
}

impl ErrorEnvelope {
    /// Creates a failure envelope.
    pub fn new(kind: ErrorKind, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
            kind,
            missing_fields: Vec::new(),
            spreadsheet_id: None,
        }
    }

    /// Creates a validation failure.
    pub fn validation(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, error, message)
    }

    /// Creates the failure returned when required fields are missing.
    pub fn missing_fields(fields: Vec<String>) -> Self {
        let mut envelope = Self::validation(
            format!("Missing required fields: {}", fields.join(", ")),
            "Please provide all required information",
        );
        envelope.missing_fields = fields;
        envelope
    }

    /// Creates the failure returned when the rate limiter rejects a caller.
    pub fn rate_limited() -> Self {
        Self::new(
            ErrorKind::RateLimited,
            "Rate limit exceeded",
            "Too many requests. Please try again later.",
        )
    }

    /// Builder method to attach the spreadsheet left behind by a partial failure.
    pub fn with_spreadsheet_id(mut self, spreadsheet_id: impl Into<String>) -> Self {
        self.spreadsheet_id = Some(spreadsheet_id.into());
        self
    }

    /// HTTP status for this failure.
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for ErrorEnvelope {}

/// Body of `POST /api/youtube/playlist`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FetchPlaylistRequest {
    /// Playlist URL or bare playlist ID.
    pub playlist_url: String,
    pub access_token: String,
}

impl fmt::Debug for FetchPlaylistRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchPlaylistRequest")
            .field("playlist_url", &self.playlist_url)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Success data of `POST /api/youtube/playlist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchPlaylistData {
    pub videos: Vec<Video>,
}

/// Body of `POST /api/sheets/create`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateSheetRequest {
    pub videos: Vec<Video>,
    pub playlist_title: String,
    pub access_token: String,
}

impl fmt::Debug for CreateSheetRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateSheetRequest")
            .field("videos", &self.videos.len())
            .field("playlist_title", &self.playlist_title)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let envelope = SuccessEnvelope::new(
            FetchPlaylistData {
                videos: vec![Video::new("abc", "First")],
            },
            "Successfully fetched 1 videos from playlist",
        );
        insta::assert_json_snapshot!(envelope, @r###"
        {
          "success": true,
          "data": {
            "videos": [
              {
                "id": "abc",
                "title": "First",
                "url": "https://www.youtube.com/watch?v=abc"
              }
            ]
          },
          "message": "Successfully fetched 1 videos from playlist"
        }
        "###);
    }

    #[test]
    fn missing_fields_envelope_shape() {
        let envelope =
            ErrorEnvelope::missing_fields(vec!["playlistUrl".into(), "accessToken".into()]);
        insta::assert_json_snapshot!(envelope, @r###"
        {
          "success": false,
          "error": "Missing required fields: playlistUrl, accessToken",
          "message": "Please provide all required information",
          "kind": "validation",
          "missingFields": [
            "playlistUrl",
            "accessToken"
          ]
        }
        "###);
        assert_eq!(envelope.status_code(), 400);
    }

    #[test]
    fn partial_failure_carries_spreadsheet_id() {
        let envelope = ErrorEnvelope::new(
            ErrorKind::PartialFailure,
            "Spreadsheet incomplete",
            "failed to write rows",
        )
        .with_spreadsheet_id("1AbC");
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"spreadsheetId\":\"1AbC\""));
        assert_eq!(envelope.status_code(), 500);
    }

    #[test]
    fn error_envelope_without_kind_defaults_to_upstream() {
        let json = r#"{"success":false,"error":"boom","message":"An error occurred"}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.kind, ErrorKind::Upstream);
        assert!(envelope.missing_fields.is_empty());
    }

    #[test]
    fn rate_limited_envelope() {
        let envelope = ErrorEnvelope::rate_limited();
        assert_eq!(envelope.status_code(), 429);
        assert_eq!(envelope.error, "Rate limit exceeded");
    }

    #[test]
    fn debug_redacts_access_token() {
        let request = FetchPlaylistRequest {
            playlist_url: "PLxyz".into(),
            access_token: "ya29.secret".into(),
        };
        let debug = format!("{:?}", request);
        assert!(!debug.contains("ya29.secret"));
        assert!(debug.contains("PLxyz"));

        let request = CreateSheetRequest {
            videos: vec![Video::new("a", "A")],
            playlist_title: "Mix".into(),
            access_token: "ya29.secret".into(),
        };
        assert!(!format!("{:?}", request).contains("ya29.secret"));
    }

    #[test]
    fn create_sheet_request_uses_camel_case() {
        let json = r#"{"videos":[],"playlistTitle":"Mix","accessToken":"t"}"#;
        let request: CreateSheetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.playlist_title, "Mix");
        assert!(request.videos.is_empty());
    }
}
