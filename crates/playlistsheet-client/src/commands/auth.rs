//! Authentication commands.

use std::path::{Path, PathBuf};

use chrono::Utc;
use playlistsheet_providers::google::{GoogleConfig, OAuthClient, OAuthCredentials};
use tracing::{info, warn};

use crate::config::{ClientConfig, GoogleSettings};
use crate::error::{ClientError, ClientResult};
use crate::session::CredentialStore;

/// Runs the Google sign-in flow and stores the granted token.
///
/// Credentials given on the command line are persisted to `config_path`
/// once sign-in succeeds. Any failure clears the session.
pub async fn google(
    client_id: Option<String>,
    client_secret: Option<String>,
    credentials_file: Option<PathBuf>,
    force: bool,
    config: &ClientConfig,
    config_path: &Path,
    store: &CredentialStore,
) -> ClientResult<()> {
    let (credentials, source) =
        resolve_google_credentials(client_id, client_secret, credentials_file, &config.google)?;
    credentials
        .validate()
        .map_err(|e| ClientError::Config(format!("invalid Google credentials: {}", e)))?;

    if store.is_valid() && !force {
        println!("Already signed in with Google.");
        println!("Use --force to sign in again.");
        return Ok(());
    }

    let google_config =
        GoogleConfig::new(credentials.clone()).with_scopes(config.google.scopes.clone());
    let client = OAuthClient::new(google_config)?;

    println!("Starting Google sign-in...");
    println!();
    println!("A browser window will open for you to authorize access.");
    println!("If the browser doesn't open, check the terminal for a URL to copy.");
    println!();

    let granted = match client.authorize().await {
        Ok(granted) => granted,
        Err(e) => {
            store.clear();
            return Err(e.into());
        }
    };

    let ttl = granted.ttl_secs(config.google.default_ttl);
    store.store(&granted.access_token, ttl);
    if !store.is_valid() {
        return Err(ClientError::Auth(
            "signed in, but the session could not be saved".to_string(),
        ));
    }

    if source == CredentialSource::Cli {
        match save_credentials_to_config(config_path, &credentials) {
            Ok(()) => println!("Credentials saved to {}", config_path.display()),
            Err(e) => warn!("could not save credentials to {}: {}", config_path.display(), e),
        }
    }

    info!(ttl, "Google sign-in successful");
    println!();
    println!("Signed in. The session is valid for {}.", format_remaining(ttl));
    Ok(())
}

/// Stores a token obtained outside the browser flow.
pub fn token(
    token: &str,
    ttl: Option<u64>,
    config: &ClientConfig,
    store: &CredentialStore,
) -> ClientResult<()> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ClientError::Auth("the token must not be empty".to_string()));
    }
    if store.is_detached() {
        return Err(ClientError::Config(
            "no session directory available; set [session] dir in config.toml".to_string(),
        ));
    }

    let ttl = ttl.unwrap_or(config.google.default_ttl);
    if ttl == 0 {
        return Err(ClientError::Config("--ttl must be positive".to_string()));
    }

    store.store(token, ttl);
    if !store.is_valid() {
        return Err(ClientError::Auth("the session could not be saved".to_string()));
    }
    println!("Token stored, valid for {}.", format_remaining(ttl));
    Ok(())
}

/// Forgets the stored token.
pub fn logout(store: &CredentialStore) -> ClientResult<()> {
    store.clear();
    println!("Signed out.");
    Ok(())
}

/// Reports whether a valid token is stored.
pub fn status(store: &CredentialStore) -> ClientResult<()> {
    println!("{}", status_line(store));
    Ok(())
}

fn status_line(store: &CredentialStore) -> String {
    let now = Utc::now();
    match store.expires_at(now) {
        Some(expiry) => {
            let remaining = (expiry - now).num_seconds().max(0) as u64;
            format!(
                "Signed in, session expires in {} (at {}).",
                format_remaining(remaining),
                expiry.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
            )
        }
        None => "Not signed in. Run `playlistsheet auth google` to sign in.".to_string(),
    }
}

fn format_remaining(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    match (hours, minutes) {
        (0, 0) => format!("{}s", secs),
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h{:02}m", h, m),
    }
}

/// Where the credentials were resolved from.
#[derive(Debug, PartialEq)]
enum CredentialSource {
    /// `--client-id`/`--client-secret` or `--credentials-file`
    Cli,
    /// `config.toml`
    Config,
}

/// Resolves Google credentials.
///
/// Priority, highest first: `--client-id` + `--client-secret`,
/// `--credentials-file`, then the `[google]` section of `config.toml`.
fn resolve_google_credentials(
    cli_client_id: Option<String>,
    cli_client_secret: Option<String>,
    cli_credentials_file: Option<PathBuf>,
    settings: &GoogleSettings,
) -> ClientResult<(OAuthCredentials, CredentialSource)> {
    if let (Some(id), Some(secret)) = (&cli_client_id, &cli_client_secret) {
        return Ok((OAuthCredentials::new(id, secret), CredentialSource::Cli));
    }

    if cli_client_id.is_some() || cli_client_secret.is_some() {
        return Err(ClientError::Config(
            "both --client-id and --client-secret are required when providing credentials directly"
                .to_string(),
        ));
    }

    if let Some(ref path) = cli_credentials_file {
        let creds = OAuthCredentials::from_file(path).map_err(|e| {
            ClientError::Config(format!(
                "failed to load credentials from {}: {}",
                path.display(),
                e
            ))
        })?;
        return Ok((creds, CredentialSource::Cli));
    }

    let creds = settings.resolve_credentials().map_err(ClientError::Config)?;
    Ok((creds, CredentialSource::Config))
}

/// Writes the OAuth client into the `[google]` section of `path`, keeping
/// every other setting and comment intact.
fn save_credentials_to_config(path: &Path, credentials: &OAuthCredentials) -> Result<(), String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.to_string()),
    };

    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| format!("could not parse {}: {}", path.display(), e))?;

    if !doc.contains_key("google") {
        doc["google"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    let google = doc["google"]
        .as_table_mut()
        .ok_or_else(|| "[google] is not a table".to_string())?;

    // A secret reference that already resolves to the same value stays.
    let keep = |key: &str, value: &str| {
        google
            .get(key)
            .and_then(|item| item.as_str())
            .filter(|raw| crate::secret::is_reference(raw))
            .is_some_and(|raw| crate::secret::resolve(raw).is_ok_and(|v| v == value))
    };
    let keep_id = keep("client_id", &credentials.client_id);
    let keep_secret = keep("client_secret", &credentials.client_secret);
    if !keep_id {
        google["client_id"] = toml_edit::value(credentials.client_id.as_str());
    }
    if !keep_secret {
        google["client_secret"] = toml_edit::value(credentials.client_secret.as_str());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    std::fs::write(path, doc.to_string()).map_err(|e| e.to_string())
}
