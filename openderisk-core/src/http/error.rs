//! HTTP error mapping utilities

use crate::error::ClientError;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

/// Map a non-2xx status and its body to a [`ClientError::Status`]
///
/// The body is kept as parsed JSON when possible so callers can still read a
/// server error code out of it; otherwise it is wrapped as `{"text": raw}`.
pub fn map_http_error(status: StatusCode, body: Option<String>) -> ClientError {
    let body = body.unwrap_or_default();
    let parsed = serde_json::from_str::<Value>(&body)
        .ok()
        .filter(|v| !v.is_null());

    ClientError::Status {
        status: status.as_u16(),
        body: parsed.unwrap_or_else(|| json!({ "text": body })),
    }
}

/// Map a reqwest send/read failure to a [`ClientError::Network`]
pub fn map_transport_error(err: &reqwest::Error, request_id: Uuid) -> ClientError {
    let message = if err.is_timeout() {
        format!("Request timed out: {} [request_id: {}]", err, request_id)
    } else if err.is_connect() {
        format!("Connection failed: {} [request_id: {}]", err, request_id)
    } else {
        format!("{} [request_id: {}]", err, request_id)
    };
    ClientError::Network { message }
}
