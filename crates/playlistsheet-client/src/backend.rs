//! Backends the orchestrator drives.
//!
//! [`DirectBackend`] calls Google from this process. [`HttpBackend`] goes
//! through a running `playlistsheet serve` instance instead.

use std::sync::Arc;
use std::time::Duration;

use playlistsheet_core::{ConversionResult, ErrorKind, PlaylistId, Video};
use playlistsheet_protocol::{
    CREATE_SHEET_PATH, CreateSheetRequest, ErrorEnvelope, FETCH_PLAYLIST_PATH, FetchPlaylistData,
    FetchPlaylistRequest, SuccessEnvelope,
};
use playlistsheet_providers::google::{ApiEndpoints, GoogleServices, build_http_client};
use playlistsheet_providers::{BoxFuture, ProviderResult};
use playlistsheet_server::{RateLimitConfig, RateLimiter};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::orchestrator::ConversionFailure;

/// Rate limiter identity for in-process conversions.
pub const LOCAL_IDENTITY: &str = "local";

/// The two remote steps of a conversion.
pub trait ConversionBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn fetch_playlist<'a>(
        &'a self,
        access_token: &'a str,
        playlist: &'a PlaylistId,
    ) -> BoxFuture<'a, Result<Vec<Video>, ConversionFailure>>;

    fn create_sheet<'a>(
        &'a self,
        access_token: &'a str,
        videos: &'a [Video],
        title: &'a str,
    ) -> BoxFuture<'a, Result<ConversionResult, ConversionFailure>>;
}

/// Calls the Google APIs in-process, behind a local rate limiter.
#[derive(Debug, Clone)]
pub struct DirectBackend {
    services: GoogleServices,
    limiter: Arc<RateLimiter>,
}

impl DirectBackend {
    pub fn new(services: GoogleServices, limiter: Arc<RateLimiter>) -> Self {
        Self { services, limiter }
    }

    pub fn from_endpoints(
        endpoints: &ApiEndpoints,
        rate_limit: RateLimitConfig,
    ) -> ProviderResult<Self> {
        Ok(Self::new(
            GoogleServices::new(endpoints)?,
            Arc::new(RateLimiter::new(rate_limit)),
        ))
    }

    fn admit(&self) -> Result<(), ConversionFailure> {
        if self.limiter.is_allowed(LOCAL_IDENTITY) {
            Ok(())
        } else {
            warn!("local rate limit exceeded");
            Err(ErrorEnvelope::rate_limited().into())
        }
    }
}

impl ConversionBackend for DirectBackend {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn fetch_playlist<'a>(
        &'a self,
        access_token: &'a str,
        playlist: &'a PlaylistId,
    ) -> BoxFuture<'a, Result<Vec<Video>, ConversionFailure>> {
        Box::pin(async move {
            self.admit()?;
            Ok(self.services.fetcher.fetch_all(access_token, playlist).await?)
        })
    }

    fn create_sheet<'a>(
        &'a self,
        access_token: &'a str,
        videos: &'a [Video],
        title: &'a str,
    ) -> BoxFuture<'a, Result<ConversionResult, ConversionFailure>> {
        Box::pin(async move {
            self.admit()?;
            Ok(self.services.builder.build(access_token, videos, title).await?)
        })
    }
}

/// Calls a `playlistsheet serve` instance.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ProviderResult<Self> {
        let user_agent = format!("playlistsheet/{}", env!("CARGO_PKG_VERSION"));
        Ok(Self {
            http_client: build_http_client(timeout, &user_agent)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ConversionFailure>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "calling server");

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                ConversionFailure::upstream(format!(
                    "could not reach {}: {}",
                    self.base_url,
                    e.without_url()
                ))
            })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            ConversionFailure::upstream(format!("failed to read server response: {}", e))
        })?;

        if status.is_success() {
            let envelope: SuccessEnvelope<T> = serde_json::from_slice(&bytes).map_err(|e| {
                ConversionFailure::upstream(format!("unexpected server response: {}", e))
            })?;
            return Ok(envelope.data);
        }

        match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
            Ok(envelope) => Err(envelope.into()),
            Err(_) => Err(ConversionFailure::new(
                ErrorKind::from_status(status.as_u16()),
                format!("server returned {}", status),
            )),
        }
    }
}

impl ConversionBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    fn fetch_playlist<'a>(
        &'a self,
        access_token: &'a str,
        playlist: &'a PlaylistId,
    ) -> BoxFuture<'a, Result<Vec<Video>, ConversionFailure>> {
        Box::pin(async move {
            let request = FetchPlaylistRequest {
                playlist_url: playlist.to_string(),
                access_token: access_token.to_string(),
            };
            let data: FetchPlaylistData = self.post(FETCH_PLAYLIST_PATH, &request).await?;
            Ok(data.videos)
        })
    }

    fn create_sheet<'a>(
        &'a self,
        access_token: &'a str,
        videos: &'a [Video],
        title: &'a str,
    ) -> BoxFuture<'a, Result<ConversionResult, ConversionFailure>> {
        Box::pin(async move {
            let request = CreateSheetRequest {
                videos: videos.to_vec(),
                playlist_title: title.to_string(),
                access_token: access_token.to_string(),
            };
            self.post(CREATE_SHEET_PATH, &request).await
        })
    }
}
