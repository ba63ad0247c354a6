//! Protocol error types.

use thiserror::Error;

use crate::types::ErrorEnvelope;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while decoding a request body.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The body is not valid JSON.
    #[error("malformed JSON body: {0}")]
    MalformedBody(#[source] serde_json::Error),

    /// One or more required fields are absent, null or blank.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// Fields are present but do not match the schema (wrong type, unknown field).
    #[error("invalid request: {0}")]
    Schema(#[source] serde_json::Error),
}

impl From<&ProtocolError> for ErrorEnvelope {
    fn from(err: &ProtocolError) -> Self {
        match err {
            ProtocolError::MissingFields(fields) => ErrorEnvelope::missing_fields(fields.clone()),
            ProtocolError::MalformedBody(_) => ErrorEnvelope::validation(
                "Invalid request body",
                "The request body must be a JSON object",
            ),
            ProtocolError::Schema(e) => {
                ErrorEnvelope::validation("Invalid request body", e.to_string())
            }
        }
    }
}
