//! HTTP transport for the OpenDerisk API
//!
//! This module implements the transport layer, handling:
//! - Connection pooling and client management
//! - Envelope parsing at the response boundary
//! - Error mapping for connection failures and non-2xx statuses
//! - Request ID generation and correlation

pub mod client;
pub mod error;

pub use client::HttpClient;

use crate::error::ClientError;
use crate::protocol::Envelope;
use async_trait::async_trait;
use futures::Stream;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::pin::Pin;
use uuid::Uuid;

/// Finite, non-restartable stream of text lines from a response body
pub type LineStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

/// HTTP method of an API call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Safe to resend after a connection failure
    pub fn is_idempotent(&self) -> bool {
        matches!(self, HttpMethod::Get)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single API call: method, path relative to the base URL, body and query
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,

    /// Path beginning with `/`, e.g. `/api/v1/chat/query`
    pub path: String,

    pub body: Option<Value>,
    pub query: Vec<(String, String)>,

    /// Unique request ID for correlation
    pub request_id: Uuid,

    /// Whether the transport may resend after a connection failure
    pub retry_connect: bool,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: Vec::new(),
            request_id: Uuid::new_v4(),
            retry_connect: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Attach a JSON body
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach an already-built JSON body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Append a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Send at most once, even for idempotent methods
    pub fn without_retry(mut self) -> Self {
        self.retry_connect = false;
        self
    }

    /// Look up a query parameter by name
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Trait for API transports
///
/// Implementations turn an [`ApiRequest`] into a parsed [`Envelope`] or a
/// categorized [`ClientError`]. The chat protocol and the client facade only
/// ever talk to this trait, so tests can substitute a scripted transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a request and parse the response envelope
    async fn request(&self, request: ApiRequest) -> Result<Envelope, ClientError>;

    /// Execute a request and stream the response body line by line
    async fn request_stream(&self, request: ApiRequest) -> Result<LineStream, ClientError> {
        Err(ClientError::invalid_request(format!(
            "streaming is not supported by this transport ({} {})",
            request.method, request.path
        )))
    }
}

/// Split buffered bytes into complete lines, leaving any partial line in `buffer`
pub(crate) fn split_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=pos).collect();
        let text = String::from_utf8_lossy(&line[..line.len() - 1]);
        lines.push(text.trim_end_matches('\r').to_string());
    }
    lines
}
