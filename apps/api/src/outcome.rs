//! Classification of an upload response into a [`RelayOutcome`].
//!
//! The relay applies it to the backend's response and the client transport to
//! the relay's response, so the PDF-or-JSON decision is made once per hop.

use axum::http::StatusCode;
use bytes::Bytes;
use serde_json::Value;

use crate::upload::is_pdf_media_type;

pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid response from backend";

/// Fields checked, in order, for a human-readable message in an error body.
const ERROR_MESSAGE_FIELDS: &[&str] = &["detail", "error"];

#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    Binary {
        bytes: Bytes,
        suggested_filename: String,
    },
    /// `raw` is the body exactly as received; `value` is its parse.
    Structured {
        value: Value,
        raw: Bytes,
    },
    Failure {
        status: u16,
        message: String,
    },
}

/// Decides the outcome of one response.
///
/// - non-2xx: `Failure` with a message pulled from the JSON body
/// - 2xx `application/pdf`: `Binary` named `suggested_filename`
/// - any other 2xx: `Structured`, or a 502 `Failure` when the body is not JSON
pub fn classify(
    status: u16,
    content_type: Option<&str>,
    body: Bytes,
    suggested_filename: &str,
) -> RelayOutcome {
    if !(200..300).contains(&status) {
        return RelayOutcome::Failure {
            status,
            message: error_message(status, &body),
        };
    }

    if content_type.is_some_and(is_pdf_media_type) {
        return RelayOutcome::Binary {
            bytes: body,
            suggested_filename: suggested_filename.to_string(),
        };
    }

    match serde_json::from_slice::<Value>(&body) {
        Ok(value) => RelayOutcome::Structured { value, raw: body },
        Err(e) => {
            tracing::warn!("Upload response was neither PDF nor JSON: {e}");
            RelayOutcome::Failure {
                status: StatusCode::BAD_GATEWAY.as_u16(),
                message: INVALID_RESPONSE_MESSAGE.to_string(),
            }
        }
    }
}

/// Extracts a message from an error body, falling back to the status text.
pub fn error_message(status: u16, body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|json| message_from_json(&json))
        .unwrap_or_else(|| status_text(status))
}

fn message_from_json(json: &Value) -> Option<String> {
    ERROR_MESSAGE_FIELDS
        .iter()
        .filter_map(|field| json.get(field))
        .find_map(render_message)
}

fn render_message(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        // Nested envelopes such as `{"error": {"message": "..."}}`
        Value::Object(map) => match map.get("message") {
            Some(Value::String(s)) => Some(s.clone()),
            _ => Some(value.to_string()),
        },
        other => Some(other.to_string()),
    }
}

/// reqwest does not keep the reason phrase from the status line, and HTTP/2
/// responses have none, so the canonical phrase for the code is used.
fn status_text(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}
