//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/playlistsheet/config.toml` by default.
//!
//! Credential values (`client_id`, `client_secret`) support secret references:
//! `pass::path/in/store` is resolved via `pass show`, `env::VAR_NAME` from the
//! environment, and anything else is used as-is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use playlistsheet_providers::google::{GoogleConfig, OAuthCredentials, default_scopes};
use serde::{Deserialize, Serialize};

use crate::session::{CredentialStore, DEFAULT_TTL_SECS};

/// Configuration for the playlistsheet client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Google OAuth settings.
    pub google: GoogleSettings,

    /// Remote server settings.
    pub server: ServerSettings,

    /// Session storage settings.
    pub session: SessionSettings,
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if it does not exist.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("playlistsheet")
    }

    /// Checks everything that can be checked without network access.
    pub fn validate(&self) -> Result<(), String> {
        if self.google.scopes.is_empty() {
            return Err("google.scopes must not be empty".to_string());
        }
        if self.google.default_ttl == 0 {
            return Err("google.default_ttl must be positive".to_string());
        }
        if self.server.timeout == 0 {
            return Err("server.timeout must be positive".to_string());
        }
        if let Some(ref url) = self.server.url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(format!("server.url must be an http(s) URL, got {:?}", url));
        }
        Ok(())
    }
}

/// Google OAuth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth client ID (supports `pass::` and `env::` prefixes).
    pub client_id: Option<String>,

    /// OAuth client secret (supports `pass::` and `env::` prefixes).
    pub client_secret: Option<String>,

    /// Google Cloud Console credentials JSON, used when the inline values are unset.
    pub credentials_file: Option<PathBuf>,

    /// OAuth scopes requested at sign-in.
    pub scopes: Vec<String>,

    /// Token lifetime in seconds when Google does not report one.
    pub default_ttl: u64,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            credentials_file: None,
            scopes: default_scopes(),
            default_ttl: DEFAULT_TTL_SECS,
        }
    }
}

impl GoogleSettings {
    /// Returns true if inline credentials or a credentials file are configured.
    pub fn has_credentials(&self) -> bool {
        (self.client_id.is_some() && self.client_secret.is_some())
            || self.credentials_file.is_some()
    }

    /// Resolves credentials and builds the OAuth configuration.
    pub fn to_provider_config(&self) -> Result<GoogleConfig, String> {
        let credentials = self.resolve_credentials()?;
        credentials.validate().map_err(|e| e.to_string())?;
        Ok(GoogleConfig::new(credentials).with_scopes(self.scopes.clone()))
    }

    /// Resolves OAuth credentials.
    ///
    /// Inline `client_id` + `client_secret` win over `credentials_file`. Each
    /// inline value goes through [`crate::secret::resolve`].
    pub(crate) fn resolve_credentials(&self) -> Result<OAuthCredentials, String> {
        match (&self.client_id, &self.client_secret) {
            (Some(raw_id), Some(raw_secret)) => {
                let id = crate::secret::resolve(raw_id)
                    .map_err(|e| format!("failed to resolve client_id: {}", e))?;
                let secret = crate::secret::resolve(raw_secret)
                    .map_err(|e| format!("failed to resolve client_secret: {}", e))?;
                Ok(OAuthCredentials::new(id, secret))
            }
            (Some(_), None) => {
                Err("client_secret is missing from [google] section in config.toml".to_string())
            }
            (None, Some(_)) => {
                Err("client_id is missing from [google] section in config.toml".to_string())
            }
            (None, None) => match self.credentials_file {
                Some(ref path) => OAuthCredentials::from_file(path).map_err(|e| {
                    format!("failed to load credentials from {}: {}", path.display(), e)
                }),
                None => Err(format!(
                    "Google credentials not found. Add to {}:\n  \
                     [google]\n  \
                     client_id = \"YOUR_ID.apps.googleusercontent.com\"\n  \
                     client_secret = \"YOUR_SECRET\"\n\n  \
                     Or run: playlistsheet auth google --credentials-file <path>",
                    ClientConfig::default_path().display()
                )),
            },
        }
    }
}

/// Remote server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Base URL of a `playlistsheet serve` instance. Conversions run
    /// in-process when unset.
    pub url: Option<String>,

    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: None,
            timeout: 30,
        }
    }
}

impl ServerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Session storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Directory holding the session entries.
    pub dir: Option<PathBuf>,
}

impl SessionSettings {
    /// Session directory: the configured one, else the per-user runtime
    /// directory, else the cache directory.
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        self.dir.clone().or_else(|| {
            dirs::runtime_dir()
                .or_else(dirs::cache_dir)
                .map(|dir| dir.join("playlistsheet").join("session"))
        })
    }

    /// Opens the credential store, detached if no directory can be found.
    pub fn credential_store(&self) -> CredentialStore {
        match self.resolved_dir() {
            Some(dir) => CredentialStore::file(dir),
            None => CredentialStore::detached(),
        }
    }
}
