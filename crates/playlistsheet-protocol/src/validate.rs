//! Request body decoding with presence validation.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ProtocolError, ProtocolResult};
use crate::types::{CreateSheetRequest, FetchPlaylistRequest};

/// A request body with a fixed set of required top-level fields.
pub trait RequestSchema: DeserializeOwned {
    /// Wire names of the fields that must be present and non-blank.
    const REQUIRED_FIELDS: &'static [&'static str];
}

impl RequestSchema for FetchPlaylistRequest {
    const REQUIRED_FIELDS: &'static [&'static str] = &["playlistUrl", "accessToken"];
}

impl RequestSchema for CreateSheetRequest {
    const REQUIRED_FIELDS: &'static [&'static str] = &["videos", "playlistTitle", "accessToken"];
}

/// Returns the required fields that are absent, null or blank strings.
///
/// A body that is not a JSON object is missing every field. The order of the
/// result follows `required`.
pub fn missing_fields(body: &Value, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|field| match body.get(**field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        })
        .map(|field| field.to_string())
        .collect()
}

/// Decodes a request body.
///
/// Presence is checked before the schema so that a body missing several
/// fields reports all of them at once rather than the first serde error.
pub fn decode_request<T: RequestSchema>(body: &[u8]) -> ProtocolResult<T> {
    let value: Value = serde_json::from_slice(body).map_err(ProtocolError::MalformedBody)?;

    let missing = missing_fields(&value, T::REQUIRED_FIELDS);
    if !missing.is_empty() {
        return Err(ProtocolError::MissingFields(missing));
    }

    serde_json::from_value(value).map_err(ProtocolError::Schema)
}
