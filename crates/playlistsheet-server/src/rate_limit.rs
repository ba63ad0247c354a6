//! Per-caller sliding-window rate limiting.
//!
//! Each caller identifier keeps the timestamps of its recently admitted
//! requests. A request is admitted when fewer than `max_requests` of them
//! fall inside the window; rejected requests leave the history untouched.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderValue;
use axum::http::header::RETRY_AFTER;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use playlistsheet_protocol::ErrorEnvelope;
use tracing::{debug, warn};

use crate::response::ApiError;

/// Identifier used when a caller cannot be identified.
pub const ANONYMOUS: &str = "anonymous";

/// Rate limiter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests admitted per window, per caller.
    pub max_requests: usize,
    pub window: Duration,
    /// Number of tracked callers above which idle ones are evicted.
    pub cleanup_threshold: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_millis(60_000),
            cleanup_threshold: 1024,
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            ..Default::default()
        }
    }
}

/// Sliding-window admission control keyed by caller.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admits or rejects a request from `identifier` at the current instant.
    pub fn is_allowed(&self, identifier: &str) -> bool {
        self.is_allowed_at(identifier, Instant::now())
    }

    /// Admits or rejects a request from `identifier` at `now`.
    pub fn is_allowed_at(&self, identifier: &str, now: Instant) -> bool {
        let mut windows = self.lock();

        if windows.len() > self.config.cleanup_threshold {
            self.evict_idle(&mut windows, now);
        }

        let history = windows.entry(identifier.to_string()).or_default();
        self.prune(history, now);

        if history.len() >= self.config.max_requests {
            return false;
        }
        history.push_back(now);
        true
    }

    /// How long until `identifier` is admitted again, if it is currently
    /// over the limit.
    pub fn retry_after_at(&self, identifier: &str, now: Instant) -> Option<Duration> {
        let mut windows = self.lock();
        let history = windows.get_mut(identifier)?;
        self.prune(history, now);

        if history.len() < self.config.max_requests {
            return None;
        }
        let oldest = history.front()?;
        Some(self.config.window.saturating_sub(now.saturating_duration_since(*oldest)))
    }

    /// Number of callers currently tracked.
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.lock().len()
    }

    fn prune(&self, history: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = history.front() {
            if now.saturating_duration_since(*oldest) >= self.config.window {
                history.pop_front();
            } else {
                break;
            }
        }
    }

    fn evict_idle(&self, windows: &mut HashMap<String, VecDeque<Instant>>, now: Instant) {
        let before = windows.len();
        windows.retain(|_, history| {
            self.prune(history, now);
            !history.is_empty()
        });
        debug!(evicted = before - windows.len(), "evicted idle rate limit windows");
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        // The map stays consistent even if a holder panicked.
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Identifies the caller: first `x-forwarded-for` entry, then the peer
/// address, then [`ANONYMOUS`].
pub fn caller_identity(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(forwarded) = forwarded {
        return forwarded.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| ANONYMOUS.to_string())
}

/// Rejects over-limit callers with 429 before the body is read.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let caller = caller_identity(&request);

    if !limiter.is_allowed(&caller) {
        warn!(%caller, path = %request.uri().path(), "rate limit exceeded");
        let mut response = ApiError::from(ErrorEnvelope::rate_limited()).into_response();
        if let Some(wait) = limiter.retry_after_at(&caller, Instant::now())
            && let Ok(value) = HeaderValue::from_str(&wait.as_secs().max(1).to_string())
        {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        return response;
    }

    next.run(request).await
}
