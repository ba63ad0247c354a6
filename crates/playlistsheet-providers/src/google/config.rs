//! Google API configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::sheets::SHEETS_API_BASE;
use super::youtube::YOUTUBE_API_BASE;

/// Read-only access to the user's YouTube account.
pub const YOUTUBE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";

/// Read/write access to the user's spreadsheets.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Google OAuth endpoints.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// OAuth 2.0 client credentials.
///
/// Users register their own OAuth client in the Google Cloud Console.
#[derive(Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Layout of the credentials JSON downloaded from the Cloud Console.
///
/// Either nested under `installed`/`web`, or flat at the root.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads credentials from a Cloud Console JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("failed to read credentials file: {}", e))?;
        Self::from_json(&content)
    }

    /// Parses credentials from a Cloud Console JSON string.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let file: CredentialsFile = serde_json::from_str(json)
            .map_err(|e| format!("failed to parse credentials JSON: {}", e))?;

        if let Some(creds) = file.installed.or(file.web) {
            return Ok(Self::new(creds.client_id, creds.client_secret));
        }

        if let (Some(client_id), Some(client_secret)) = (file.client_id, file.client_secret) {
            return Ok(Self::new(client_id, client_secret));
        }

        Err("credentials file must contain an 'installed'/'web' section or a root-level 'client_id'/'client_secret'".to_string())
    }

    /// Checks the credentials look like a Google OAuth client.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Where the YouTube and Sheets clients send their requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    pub youtube_base: String,
    pub sheets_base: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            youtube_base: YOUTUBE_API_BASE.to_string(),
            sheets_base: SHEETS_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("playlistsheet/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiEndpoints {
    pub fn with_youtube_base(mut self, base: impl Into<String>) -> Self {
        self.youtube_base = base.into();
        self
    }

    pub fn with_sheets_base(mut self, base: impl Into<String>) -> Self {
        self.sheets_base = base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Configuration for Google sign-in.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub credentials: OAuthCredentials,

    /// Scopes requested at sign-in.
    ///
    /// Defaults to YouTube read-only plus Sheets read/write.
    pub scopes: Vec<String>,

    /// Port range tried for the loopback redirect server.
    pub loopback_port_range: (u16, u16),

    pub timeout: Duration,
    pub auth_url: String,
    pub token_url: String,
}

impl GoogleConfig {
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            scopes: default_scopes(),
            loopback_port_range: (8080, 8090),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_loopback_port_range(mut self, start: u16, end: u16) -> Self {
        self.loopback_port_range = (start, end);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.credentials
            .validate()
            .map_err(|e| format!("invalid credentials: {}", e))?;

        if self.scopes.is_empty() {
            return Err("at least one OAuth scope is required".to_string());
        }

        if self.loopback_port_range.0 > self.loopback_port_range.1 {
            return Err("invalid loopback port range".to_string());
        }

        Ok(())
    }
}

/// Scopes needed to read playlists and create spreadsheets.
pub fn default_scopes() -> Vec<String> {
    vec![
        YOUTUBE_READONLY_SCOPE.to_string(),
        SPREADSHEETS_SCOPE.to_string(),
    ]
}
