//! Conversion orchestration.
//!
//! A [`Converter`] runs one playlist-to-spreadsheet conversion as a small
//! state machine:
//!
//! ```text
//! Idle -> FetchingCredential -> FetchingPlaylist -> CreatingSheet -> Succeeded
//!                  |                   |                  |
//!                  +-------------------+------------------+-----> Failed
//! ```
//!
//! A reference that does not resolve to a playlist ID leaves the converter
//! `Idle`. Every other path ends in a terminal state, and a converter never
//! runs twice.

use std::fmt;

use chrono::NaiveDate;
use playlistsheet_core::{ConversionResult, ErrorKind, extract_playlist_id};
use playlistsheet_protocol::ErrorEnvelope;
use playlistsheet_providers::ProviderError;
use tracing::{debug, info, instrument, warn};

use crate::backend::ConversionBackend;
use crate::session::CredentialStore;

pub const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";
pub const NO_VIDEOS: &str = "No videos found in the playlist";
pub const INVALID_REFERENCE: &str = "Please enter a valid YouTube playlist URL";

/// Where a conversion currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionState {
    Idle,
    FetchingCredential,
    FetchingPlaylist,
    CreatingSheet,
    Succeeded,
    Failed,
}

impl ConversionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingCredential => "fetching_credential",
            Self::FetchingPlaylist => "fetching_playlist",
            Self::CreatingSheet => "creating_sheet",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Progress line shown to the user.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::FetchingCredential => "Checking sign-in...",
            Self::FetchingPlaylist => "Fetching playlist videos...",
            Self::CreatingSheet => "Creating spreadsheet...",
            Self::Succeeded => "Done",
            Self::Failed => "Conversion failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for ConversionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed conversion as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionFailure {
    pub kind: ErrorKind,
    /// Short label, e.g. "Authentication required".
    pub label: String,
    pub message: String,
    /// Set when a spreadsheet was created before the failure.
    pub spreadsheet_id: Option<String>,
}

impl ConversionFailure {
    /// Creates a failure labelled after its kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            label: kind.label().to_string(),
            message: message.into(),
            spreadsheet_id: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Upstream, message)
    }

    pub fn with_spreadsheet_id(mut self, spreadsheet_id: impl Into<String>) -> Self {
        self.spreadsheet_id = Some(spreadsheet_id.into());
        self
    }

    /// Masks every occurrence of `secret` in the label and message.
    pub fn redact(mut self, secret: &str) -> Self {
        if !secret.is_empty() {
            self.label = self.label.replace(secret, "[redacted]");
            self.message = self.message.replace(secret, "[redacted]");
        }
        self
    }
}

impl fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.message)?;
        if let Some(ref id) = self.spreadsheet_id {
            write!(f, " (spreadsheet {})", id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConversionFailure {}

impl From<ProviderError> for ConversionFailure {
    fn from(err: ProviderError) -> Self {
        let failure = Self::new(err.kind(), err.message());
        match err.spreadsheet_id() {
            Some(id) => failure.with_spreadsheet_id(id),
            None => failure,
        }
    }
}

impl From<ErrorEnvelope> for ConversionFailure {
    fn from(envelope: ErrorEnvelope) -> Self {
        Self {
            kind: envelope.kind,
            label: envelope.error,
            message: envelope.message,
            spreadsheet_id: envelope.spreadsheet_id,
        }
    }
}

/// Receives every state transition of a [`Converter`].
pub trait ProgressObserver: Send + Sync {
    fn on_transition(&self, from: ConversionState, to: ConversionState);
}

impl<F> ProgressObserver for F
where
    F: Fn(ConversionState, ConversionState) + Send + Sync,
{
    fn on_transition(&self, from: ConversionState, to: ConversionState) {
        self(from, to)
    }
}

/// Title used when the user gives none.
pub fn default_title(today: NaiveDate) -> String {
    format!("Playlist - {}", today.format("%Y-%m-%d"))
}

/// Drives one conversion.
pub struct Converter<'a> {
    credentials: &'a CredentialStore,
    backend: &'a dyn ConversionBackend,
    observer: Option<&'a dyn ProgressObserver>,
    state: ConversionState,
    input: String,
}

impl<'a> Converter<'a> {
    pub fn new(credentials: &'a CredentialStore, backend: &'a dyn ConversionBackend) -> Self {
        Self {
            credentials,
            backend,
            observer: None,
            state: ConversionState::Idle,
            input: String::new(),
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    pub fn state(&self) -> ConversionState {
        self.state
    }

    /// The playlist reference as entered. Cleared on success only.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Runs the conversion with today's local date as the title fallback.
    pub async fn convert(
        &mut self,
        title: Option<&str>,
    ) -> Result<ConversionResult, ConversionFailure> {
        let today = chrono::Local::now().date_naive();
        self.convert_on(title, today).await
    }

    #[instrument(skip_all, fields(backend = self.backend.name()))]
    pub async fn convert_on(
        &mut self,
        title: Option<&str>,
        today: NaiveDate,
    ) -> Result<ConversionResult, ConversionFailure> {
        if self.state != ConversionState::Idle {
            return Err(ConversionFailure::validation(
                "This conversion has already run",
            ));
        }

        let playlist = match extract_playlist_id(&self.input) {
            Ok(playlist) => playlist,
            Err(e) => {
                debug!(error = %e, "rejected playlist reference");
                return Err(ConversionFailure::validation(INVALID_REFERENCE));
            }
        };

        self.transition(ConversionState::FetchingCredential);
        let Some(token) = self.credentials.get() else {
            return Err(self.fail(ConversionFailure::new(
                ErrorKind::Authentication,
                SESSION_EXPIRED,
            )));
        };

        let backend = self.backend;

        self.transition(ConversionState::FetchingPlaylist);
        let videos = match backend.fetch_playlist(&token, &playlist).await {
            Ok(videos) => videos,
            Err(failure) => return Err(self.fail(failure.redact(&token))),
        };
        if videos.is_empty() {
            return Err(self.fail(ConversionFailure::new(ErrorKind::NotFound, NO_VIDEOS)));
        }
        debug!(%playlist, videos = videos.len(), "playlist fetched");

        self.transition(ConversionState::CreatingSheet);
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_title(today));

        match backend.create_sheet(&token, &videos, &title).await {
            Ok(result) => {
                self.transition(ConversionState::Succeeded);
                self.input.clear();
                info!(
                    spreadsheet_id = %result.spreadsheet_id,
                    videos = result.video_count,
                    "conversion finished"
                );
                Ok(result)
            }
            Err(failure) => Err(self.fail(failure.redact(&token))),
        }
    }

    fn transition(&mut self, to: ConversionState) {
        let from = self.state;
        self.state = to;
        debug!(%from, %to, "conversion state");
        if let Some(observer) = self.observer {
            observer.on_transition(from, to);
        }
    }

    fn fail(&mut self, failure: ConversionFailure) -> ConversionFailure {
        self.transition(ConversionState::Failed);
        warn!(kind = %failure.kind, "{}", failure.message);
        failure
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use playlistsheet_core::{PlaylistId, Video};
    use playlistsheet_providers::BoxFuture;

    use super::*;

    const TOKEN: &str = "ya29.session";

    #[derive(Default)]
    struct FakeBackend {
        videos: Vec<Video>,
        fetch_failure: Option<ConversionFailure>,
        create_failure: Option<ConversionFailure>,
        fetches: AtomicUsize,
        created_titles: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn with_videos(n: usize) -> Self {
            Self {
                videos: (0..n)
                    .map(|i| Video::new(format!("v{i}"), format!("Video {i}")))
                    .collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.fetches.load(Ordering::SeqCst) + self.created_titles.lock().unwrap().len()
        }
    }

    impl ConversionBackend for FakeBackend {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn fetch_playlist<'a>(
            &'a self,
            access_token: &'a str,
            playlist: &'a PlaylistId,
        ) -> BoxFuture<'a, Result<Vec<Video>, ConversionFailure>> {
            Box::pin(async move {
                assert_eq!(access_token, TOKEN);
                assert_eq!(playlist.as_str(), "PLxyz");
                self.fetches.fetch_add(1, Ordering::SeqCst);
                match &self.fetch_failure {
                    Some(failure) => Err(failure.clone()),
                    None => Ok(self.videos.clone()),
                }
            })
        }

        fn create_sheet<'a>(
            &'a self,
            _access_token: &'a str,
            videos: &'a [Video],
            title: &'a str,
        ) -> BoxFuture<'a, Result<ConversionResult, ConversionFailure>> {
            Box::pin(async move {
                self.created_titles.lock().unwrap().push(title.to_string());
                match &self.create_failure {
                    Some(failure) => Err(failure.clone()),
                    None => Ok(ConversionResult::new("1Sheet", videos.len())),
                }
            })
        }
    }

    fn signed_in() -> CredentialStore {
        let store = CredentialStore::in_memory();
        store.store(TOKEN, 3600);
        store
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[tokio::test]
    async fn success_walks_every_state_and_clears_input() {
        let store = signed_in();
        let backend = FakeBackend::with_videos(3);
        let seen = Mutex::new(Vec::new());
        let observer = |from: ConversionState, to: ConversionState| {
            seen.lock().unwrap().push((from, to));
        };

        let mut converter = Converter::new(&store, &backend)
            .with_observer(&observer)
            .with_input("https://youtube.com/playlist?list=PLxyz");
        let result = converter.convert_on(Some("Road trip"), today()).await.unwrap();

        assert_eq!(result.spreadsheet_id, "1Sheet");
        assert_eq!(result.video_count, 3);
        assert_eq!(converter.state(), ConversionState::Succeeded);
        assert!(converter.input().is_empty());

        use ConversionState::*;
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (Idle, FetchingCredential),
                (FetchingCredential, FetchingPlaylist),
                (FetchingPlaylist, CreatingSheet),
                (CreatingSheet, Succeeded),
            ]
        );
        assert_eq!(*backend.created_titles.lock().unwrap(), vec!["Road trip"]);
    }

    #[tokio::test]
    async fn invalid_reference_stays_idle() {
        let store = signed_in();
        let backend = FakeBackend::with_videos(1);
        let mut converter =
            Converter::new(&store, &backend).with_input("https://youtube.com/watch?v=abc");

        let failure = converter.convert_on(None, today()).await.unwrap_err();
        assert_eq!(failure.kind, ErrorKind::Validation);
        assert_eq!(converter.state(), ConversionState::Idle);
        assert_eq!(backend.calls(), 0);

        // Still usable with a corrected reference.
        converter.set_input("PLxyz");
        assert!(converter.convert_on(None, today()).await.is_ok());
    }

    #[tokio::test]
    async fn missing_credential_fails_without_remote_calls() {
        let store = CredentialStore::in_memory();
        let backend = FakeBackend::with_videos(1);
        let mut converter = Converter::new(&store, &backend).with_input("PLxyz");

        let failure = converter.convert_on(None, today()).await.unwrap_err();
        assert_eq!(failure.kind, ErrorKind::Authentication);
        assert_eq!(failure.message, SESSION_EXPIRED);
        assert_eq!(converter.state(), ConversionState::Failed);
        assert_eq!(converter.input(), "PLxyz");
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn empty_playlist_is_not_found() {
        let store = signed_in();
        let backend = FakeBackend::with_videos(0);
        let mut converter = Converter::new(&store, &backend).with_input("PLxyz");

        let failure = converter.convert_on(None, today()).await.unwrap_err();
        assert_eq!(failure.kind, ErrorKind::NotFound);
        assert_eq!(failure.message, NO_VIDEOS);
        assert!(backend.created_titles.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_is_surfaced_without_the_token() {
        let store = signed_in();
        let backend = FakeBackend {
            fetch_failure: Some(ConversionFailure::new(
                ErrorKind::RateLimited,
                format!("quota exceeded for {TOKEN}"),
            )),
            ..FakeBackend::with_videos(1)
        };
        let mut converter = Converter::new(&store, &backend).with_input("PLxyz");

        let failure = converter.convert_on(None, today()).await.unwrap_err();
        assert_eq!(failure.kind, ErrorKind::RateLimited);
        assert_eq!(failure.label, "Rate limit exceeded");
        assert!(!failure.to_string().contains(TOKEN));
        assert_eq!(converter.state(), ConversionState::Failed);
        assert_eq!(converter.input(), "PLxyz");
    }

    #[tokio::test]
    async fn partial_failure_keeps_spreadsheet_id() {
        let store = signed_in();
        let backend = FakeBackend {
            create_failure: Some(
                ConversionFailure::new(ErrorKind::PartialFailure, "formatting failed")
                    .with_spreadsheet_id("1Orphan"),
            ),
            ..FakeBackend::with_videos(2)
        };
        let mut converter = Converter::new(&store, &backend).with_input("PLxyz");

        let failure = converter.convert_on(None, today()).await.unwrap_err();
        assert_eq!(failure.spreadsheet_id.as_deref(), Some("1Orphan"));
        assert_eq!(
            failure.to_string(),
            "Spreadsheet incomplete: formatting failed (spreadsheet 1Orphan)"
        );
    }

    #[tokio::test]
    async fn blank_title_uses_the_date() {
        let store = signed_in();
        let backend = FakeBackend::with_videos(1);
        let mut converter = Converter::new(&store, &backend).with_input("PLxyz");

        converter.convert_on(Some("   "), today()).await.unwrap();
        assert_eq!(
            *backend.created_titles.lock().unwrap(),
            vec!["Playlist - 2024-03-15"]
        );
    }

    #[tokio::test]
    async fn runs_only_once() {
        let store = signed_in();
        let backend = FakeBackend::with_videos(1);
        let mut converter = Converter::new(&store, &backend).with_input("PLxyz");

        converter.convert_on(None, today()).await.unwrap();
        converter.set_input("PLxyz");
        let failure = converter.convert_on(None, today()).await.unwrap_err();
        assert_eq!(failure.kind, ErrorKind::Validation);
        assert_eq!(backend.fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn envelope_kind_is_kept() {
        let envelope = ErrorEnvelope::rate_limited();
        let failure = ConversionFailure::from(envelope);
        assert_eq!(failure.kind, ErrorKind::RateLimited);
        assert_eq!(failure.label, "Rate limit exceeded");
        assert_eq!(failure.message, "Too many requests. Please try again later.");
    }
}
