//! Typed client for the OpenDerisk platform
//!
//! [`OpenDeriskClient`] is a thin layer over a [`Transport`]: each method
//! builds one request, sends it and turns the envelope into domain types.
//! Operations are grouped by resource in the submodules.

mod agent;
mod chat;
mod mcp;

pub use mcp::McpEndpoint;

use crate::config::ApiConfig;
use crate::error::ClientError;
use crate::http::{HttpClient, Transport};
use crate::protocol::Envelope;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Client for every platform operation
#[derive(Clone)]
pub struct OpenDeriskClient {
    transport: Arc<dyn Transport>,
}

impl OpenDeriskClient {
    /// Client over an HTTP transport configured from the `api` section
    pub fn from_config(config: &ApiConfig) -> Result<Self, ClientError> {
        Ok(Self::with_transport(Arc::new(HttpClient::from_config(
            config,
        )?)))
    }

    /// Client over any transport
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

impl std::fmt::Debug for OpenDeriskClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenDeriskClient").finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    Ok(serde_json::from_value(value)?)
}

/// Decode a JSON array of items; anything else reads as empty
///
/// Items that do not decode are skipped so one odd record does not hide
/// the rest of the listing.
fn decode_list<T: DeserializeOwned>(value: Value) -> Vec<T> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Skipping undecodable list item: {}", e);
                None
            }
        })
        .collect()
}

/// Payload of a success envelope, `None` when it carries no data
///
/// A failure envelope becomes [`ClientError::Api`] with the server's
/// `err_msg`, or `default` when it has none.
fn success_data(envelope: Envelope, default: &str) -> Result<Option<Value>, ClientError> {
    match envelope {
        Envelope::Success { .. } => Ok(envelope.into_data()),
        failure => Err(ClientError::api(
            failure_message(&failure, default),
            failure.to_value(),
        )),
    }
}

fn failure_message(envelope: &Envelope, default: &str) -> String {
    match envelope {
        Envelope::Failure {
            err_msg: Some(msg), ..
        } if !msg.is_empty() => msg.clone(),
        _ => default.to_string(),
    }
}
