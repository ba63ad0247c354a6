//! Error types for remote Google API operations.
//!
//! Every failure carries an [`ErrorKind`] decided at the call site, so callers
//! never have to guess from message text whether a failure was an expired
//! token, a missing playlist or an exhausted quota.

use std::fmt;

use playlistsheet_core::ErrorKind;
use thiserror::Error;

use crate::google::BuildStep;

/// An error that occurred while talking to YouTube or Google Sheets.
#[derive(Debug, Error)]
pub struct ProviderError {
    kind: ErrorKind,
    message: String,
    /// The `reason` Google reported in its error body, if any.
    reason: Option<String>,
    /// Spreadsheet left behind when a later build step failed.
    spreadsheet_id: Option<String>,
    /// Build step that failed after the spreadsheet was created.
    step: Option<BuildStep>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            reason: None,
            spreadsheet_id: None,
            step: None,
            source: None,
        }
    }

    /// Creates a validation error (bad input, no remote call was made).
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates a rate limit error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    /// Creates an upstream error (transport failure, 5xx, undecodable body).
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Upstream, message)
    }

    /// Wraps a failure that happened after a spreadsheet was already created.
    ///
    /// The spreadsheet is not deleted; its ID travels with the error so the
    /// caller can report it.
    pub fn partial_failure(
        spreadsheet_id: impl Into<String>,
        step: BuildStep,
        cause: ProviderError,
    ) -> Self {
        let spreadsheet_id = spreadsheet_id.into();
        Self {
            kind: ErrorKind::PartialFailure,
            message: format!(
                "spreadsheet {} was created but {} failed: {}",
                spreadsheet_id, step, cause.message
            ),
            reason: cause.reason.clone(),
            spreadsheet_id: Some(spreadsheet_id),
            step: Some(step),
            source: Some(Box::new(cause)),
        }
    }

    /// Sets the Google error reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.spreadsheet_id.as_deref()
    }

    pub fn step(&self) -> Option<BuildStep> {
        self.step
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
