//! Endpoint handlers.
//!
//! Bodies are taken as raw bytes and decoded here, so that presence
//! validation, unknown fields and malformed JSON all produce the same
//! envelope instead of axum's plain-text extractor rejections.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use playlistsheet_core::ConversionResult;
use playlistsheet_protocol::{
    CreateSheetRequest, FetchPlaylistData, FetchPlaylistRequest, SuccessEnvelope, decode_request,
};
use playlistsheet_providers::google::GoogleServices;
use serde_json::json;
use tracing::info;

use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::response::ApiError;

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub services: GoogleServices,
}

impl AppState {
    pub fn new(rate_limit: RateLimitConfig, services: GoogleServices) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::new(rate_limit)),
            services,
        }
    }
}

/// `POST /api/youtube/playlist`
#[tracing::instrument(skip_all)]
pub async fn fetch_playlist(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SuccessEnvelope<FetchPlaylistData>>, ApiError> {
    let request: FetchPlaylistRequest = decode_request(&body)?;

    let videos = state
        .services
        .fetcher
        .fetch_reference(&request.access_token, &request.playlist_url)
        .await?;

    info!(videos = videos.len(), "playlist fetched");
    let message = format!("Successfully fetched {} videos from playlist", videos.len());
    Ok(Json(SuccessEnvelope::new(FetchPlaylistData { videos }, message)))
}

/// `POST /api/sheets/create`
#[tracing::instrument(skip_all)]
pub async fn create_sheet(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SuccessEnvelope<ConversionResult>>, ApiError> {
    let request: CreateSheetRequest = decode_request(&body)?;

    let result = state
        .services
        .builder
        .build(
            &request.access_token,
            &request.videos,
            &request.playlist_title,
        )
        .await?;

    info!(spreadsheet_id = %result.spreadsheet_id, videos = result.video_count, "spreadsheet created");
    let message = format!(
        "Successfully created spreadsheet with {} videos",
        result.video_count
    );
    Ok(Json(SuccessEnvelope::new(result, message)))
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
