//! Shared request plumbing for the Google REST clients.
//!
//! All Google APIs report failures with the same JSON shape:
//!
//! ```json
//! {"error": {"code": 403, "message": "...", "status": "PERMISSION_DENIED",
//!            "errors": [{"reason": "quotaExceeded", "domain": "youtube.quota"}]}}
//! ```
//!
//! [`classify`] turns a status plus that body into a [`ProviderError`] with
//! the right [`ErrorKind`](playlistsheet_core::ErrorKind).

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Reasons Google uses for quota and rate limit rejections, which arrive as 403.
const QUOTA_REASONS: [&str; 6] = [
    "quotaExceeded",
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "dailyLimitExceeded",
    "RATE_LIMIT_EXCEEDED",
    "RESOURCE_EXHAUSTED",
];

/// Builds the HTTP client shared by the YouTube and Sheets clients.
pub fn build_http_client(timeout: Duration, user_agent: &str) -> ProviderResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| {
            ProviderError::upstream(format!("failed to create HTTP client: {}", e)).with_source(e)
        })
}

/// Sends a request and classifies a non-success response.
///
/// `operation` names the remote call in error messages (e.g.
/// `"playlistItems.list"`).
pub(crate) async fn send(
    request: reqwest::RequestBuilder,
    operation: &str,
) -> ProviderResult<reqwest::Response> {
    let response = request.send().await.map_err(|e| {
        let message = if e.is_timeout() {
            format!("{} timed out", operation)
        } else if e.is_connect() {
            format!("{} connection failed: {}", operation, e.without_url())
        } else {
            format!("{} request failed: {}", operation, e.without_url())
        };
        ProviderError::upstream(message)
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(operation, status = status.as_u16(), "remote call failed");
    Err(classify(operation, status.as_u16(), &body))
}

/// Reads and decodes a JSON response body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: &str,
) -> ProviderResult<T> {
    let body = response.text().await.map_err(|e| {
        ProviderError::upstream(format!("failed to read {} response: {}", operation, e))
    })?;

    serde_json::from_str(&body).map_err(|e| {
        ProviderError::upstream(format!("failed to parse {} response: {}", operation, e))
            .with_source(e)
    })
}

/// Classifies a failed response from its status and Google error body.
pub fn classify(operation: &str, status: u16, body: &str) -> ProviderError {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|r| r.error);

    let reason = detail.as_ref().and_then(ErrorDetail::reason);
    let google_message = detail
        .as_ref()
        .and_then(|d| d.message.as_deref())
        .filter(|m| !m.is_empty());

    let message = match google_message {
        Some(m) => format!("{} failed ({}): {}", operation, status, m),
        None => format!("{} failed ({})", operation, status),
    };

    let is_quota = detail.as_ref().is_some_and(ErrorDetail::is_quota);

    let err = match status {
        401 => ProviderError::authentication(message),
        403 if is_quota => ProviderError::rate_limited(message),
        403 => ProviderError::authentication(message),
        404 => ProviderError::not_found(message),
        429 => ProviderError::rate_limited(message),
        _ => ProviderError::upstream(message),
    };

    match reason {
        Some(reason) => err.with_reason(reason),
        None => err,
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
    /// Legacy per-error list (YouTube Data API).
    #[serde(default)]
    errors: Vec<ErrorItem>,
    /// `google.rpc` details (Sheets API).
    #[serde(default)]
    details: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    #[serde(default)]
    reason: Option<String>,
}

impl ErrorDetail {
    fn reasons(&self) -> impl Iterator<Item = &str> {
        self.errors
            .iter()
            .chain(self.details.iter())
            .filter_map(|item| item.reason.as_deref())
    }

    fn reason(&self) -> Option<String> {
        self.reasons().next().map(String::from)
    }

    fn is_quota(&self) -> bool {
        self.status.as_deref() == Some("RESOURCE_EXHAUSTED")
            || self.reasons().any(|r| QUOTA_REASONS.contains(&r))
    }
}
