//! Mapping from domain errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use playlistsheet_core::ErrorKind;
use playlistsheet_protocol::{ErrorEnvelope, ProtocolError};
use playlistsheet_providers::ProviderError;
use tracing::{error, warn};

/// A failed request, rendered as an [`ErrorEnvelope`] with the matching status.
#[derive(Debug)]
pub struct ApiError(pub ErrorEnvelope);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}

impl From<ErrorEnvelope> for ApiError {
    fn from(envelope: ErrorEnvelope) -> Self {
        Self(envelope)
    }
}

impl From<ProtocolError> for ApiError {
    fn from(err: ProtocolError) -> Self {
        warn!(error = %err, "rejected request body");
        Self(ErrorEnvelope::from(&err))
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err.kind() {
            ErrorKind::Upstream | ErrorKind::PartialFailure => {
                error!(kind = %err.kind(), reason = ?err.reason(), "{}", err.message())
            }
            _ => warn!(kind = %err.kind(), reason = ?err.reason(), "{}", err.message()),
        }

        let envelope = ErrorEnvelope::new(err.kind(), err.kind().label(), err.message());
        Self(match err.spreadsheet_id() {
            Some(id) => envelope.with_spreadsheet_id(id),
            None => envelope,
        })
    }
}
