//! Failure taxonomy shared by every layer of the conversion pipeline.
//!
//! A failure is classified once, where it happens (the remote-call wrapper,
//! the request validator, the rate limiter), and the [`ErrorKind`] travels with
//! it up to the caller. Nothing downstream re-derives the kind from a message.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The category of a conversion failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or missing input; the user must correct it.
    Validation,
    /// Expired, invalid or missing credential; the user must sign in again.
    Authentication,
    /// The referenced playlist or resource does not exist.
    NotFound,
    /// Local or remote throttling; back off and retry later.
    RateLimited,
    /// Unclassified failure from a remote API.
    Upstream,
    /// The spreadsheet exists but was not fully populated or formatted.
    PartialFailure,
}

impl ErrorKind {
    /// Returns the snake_case wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::Upstream => "upstream",
            Self::PartialFailure => "partial_failure",
        }
    }

    /// HTTP status used when this kind crosses the endpoint boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Authentication => 401,
            Self::NotFound => 404,
            Self::RateLimited => 429,
            Self::Upstream | Self::PartialFailure => 500,
        }
    }

    /// Short user-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation => "Invalid request",
            Self::Authentication => "Authentication required",
            Self::NotFound => "Resource not found",
            Self::RateLimited => "Rate limit exceeded",
            Self::Upstream => "Upstream error",
            Self::PartialFailure => "Spreadsheet incomplete",
        }
    }

    /// Maps an HTTP status back to a kind. Unknown statuses are `Upstream`.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::Validation,
            401 | 403 => Self::Authentication,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            _ => Self::Upstream,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
