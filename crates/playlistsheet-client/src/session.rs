//! Session-scoped credential storage.
//!
//! The [`CredentialStore`] keeps one bearer token and its absolute expiry as
//! two entries in a [`SessionBackend`]:
//!
//! - `auth_token`: the token itself
//! - `auth_token_expiry`: expiry as epoch milliseconds
//!
//! A token is only ever handed out strictly before its expiry. Reading it at
//! or after expiry clears both entries. Backend failures are logged and read
//! as "no token"; they never reach the caller.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

/// Session key holding the bearer token.
pub const TOKEN_KEY: &str = "auth_token";

/// Session key holding the expiry (epoch milliseconds).
pub const EXPIRY_KEY: &str = "auth_token_expiry";

/// Lifetime used when the identity provider does not report one.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// A string key/value store whose lifetime is one sign-in session.
pub trait SessionBackend: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// One file per key inside a session directory.
///
/// Files are created owner-readable only on Unix.
#[derive(Debug, Clone)]
pub struct FileSession {
    dir: PathBuf,
}

impl FileSession {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl SessionBackend for FileSession {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value.trim_end().to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(self.path(key))?;
        io::Write::write_all(&mut file, value.as_bytes())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// In-process session, gone when the process exits.
#[derive(Debug, Default)]
pub struct MemorySession {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionBackend for MemorySession {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Holds the current bearer token and its expiry.
#[derive(Debug)]
pub struct CredentialStore {
    backend: Option<Box<dyn SessionBackend>>,
}

impl CredentialStore {
    pub fn new(backend: impl SessionBackend + 'static) -> Self {
        Self {
            backend: Some(Box::new(backend)),
        }
    }

    /// A store with no session behind it. Stores are dropped, reads are empty.
    pub fn detached() -> Self {
        Self { backend: None }
    }

    pub fn in_memory() -> Self {
        Self::new(MemorySession::new())
    }

    pub fn file(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileSession::new(dir))
    }

    pub fn is_detached(&self) -> bool {
        self.backend.is_none()
    }

    /// Stores `token`, valid for `ttl_secs` from now.
    pub fn store(&self, token: &str, ttl_secs: u64) {
        self.store_at(token, ttl_secs, Utc::now());
    }

    pub fn store_at(&self, token: &str, ttl_secs: u64, now: DateTime<Utc>) {
        let Some(backend) = &self.backend else {
            debug!("no session attached, token not stored");
            return;
        };

        let expiry = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let result = backend
            .set(TOKEN_KEY, token)
            .and_then(|()| backend.set(EXPIRY_KEY, &expiry.timestamp_millis().to_string()));
        match result {
            Ok(()) => debug!(expires_at = %expiry, "stored access token"),
            Err(e) => warn!(error = %e, "failed to store access token"),
        }
    }

    /// Returns the token if it has not expired.
    pub fn get(&self) -> Option<String> {
        self.get_at(Utc::now())
    }

    pub fn get_at(&self, now: DateTime<Utc>) -> Option<String> {
        let backend = self.backend.as_ref()?;

        let (token, expiry) = match (backend.get(TOKEN_KEY), backend.get(EXPIRY_KEY)) {
            (Ok(Some(token)), Ok(Some(expiry))) => (token, expiry),
            (Ok(_), Ok(_)) => return None,
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "failed to read access token");
                return None;
            }
        };

        let Some(expiry) = parse_expiry(&expiry) else {
            warn!("stored token expiry is unreadable, clearing session");
            self.clear();
            return None;
        };

        if now >= expiry {
            debug!(expired_at = %expiry, "access token expired, clearing session");
            self.clear();
            return None;
        }
        Some(token)
    }

    pub fn is_valid(&self) -> bool {
        self.get().is_some()
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.get_at(now).is_some()
    }

    /// Expiry of the stored token, if one is stored and still valid.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.get_at(now)?;
        let backend = self.backend.as_ref()?;
        backend
            .get(EXPIRY_KEY)
            .ok()
            .flatten()
            .and_then(|raw| parse_expiry(&raw))
    }

    /// Removes both entries. Safe to call when nothing is stored.
    pub fn clear(&self) {
        let Some(backend) = &self.backend else {
            return;
        };
        for key in [TOKEN_KEY, EXPIRY_KEY] {
            if let Err(e) = backend.remove(key) {
                warn!(error = %e, key, "failed to clear session entry");
            }
        }
    }
}

fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}
