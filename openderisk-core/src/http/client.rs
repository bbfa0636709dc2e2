//! HTTP client implementation using reqwest

use crate::config::{redact_value, ApiConfig};
use crate::error::ClientError;
use crate::http::error::{map_http_error, map_transport_error};
use crate::http::{split_lines, ApiRequest, HttpMethod, LineStream, Transport};
use crate::protocol::Envelope;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Maximum response size (10MB)
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Default user agent
const USER_AGENT: &str = concat!("openderisk-cli/", env!("CARGO_PKG_VERSION"));

const PREVIEW_CHARS: usize = 200;

/// Shared HTTP client with connection pooling
///
/// Clones share one pooled `reqwest::Client`; the pool is released when the
/// last clone is dropped.
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: Arc<Client>,

    /// Base URL without a trailing `/`
    base_url: String,

    /// Maximum response size to prevent OOM
    max_response_size: usize,

    /// Attempts for idempotent requests that fail to connect
    max_attempts: u32,

    retry_backoff: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with a fixed per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        Self::with_config(base_url, Duration::from_secs(10), timeout, 10)
    }

    /// Create a new HTTP client with custom pool and timeout settings
    pub fn with_config(
        base_url: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
        max_idle_per_host: usize,
    ) -> Result<Self, ClientError> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(connect_timeout.min(request_timeout))
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| ClientError::Network {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_response_size: MAX_RESPONSE_SIZE,
            max_attempts: 1,
            retry_backoff: Duration::ZERO,
        })
    }

    /// Create a client from the `api` section of the configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, ClientError> {
        let client = Self::new(&config.base_url, Duration::from_secs(config.timeout))?;
        Ok(client.with_retry(
            config.retry_max_attempts,
            Duration::from_secs_f64(config.retry_backoff_factor.max(0.0)),
        ))
    }

    /// Retry idempotent requests that fail before reaching the server
    pub fn with_retry(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn build_request(&self, request: &ApiRequest) -> RequestBuilder {
        let url = self.build_url(&request.path);
        let builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        let mut builder = builder
            .header("Content-Type", "application/json")
            .header("X-Request-ID", request.request_id.to_string());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
    }

    /// Send a request, retrying connection failures of idempotent calls
    async fn send(&self, request: &ApiRequest) -> Result<Response, ClientError> {
        debug!(
            method = %request.method,
            url = %self.build_url(&request.path),
            query = ?request.query,
            body = ?request.body.as_ref().map(redact_value),
            request_id = %request.request_id,
            "Sending API request"
        );

        let attempts = self.attempts_for(request);

        let mut attempt = 1;
        loop {
            match self.build_request(request).send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() && attempt < attempts => {
                    let delay = self.retry_backoff * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        "Connection to {} failed (attempt {}/{}), retrying in {:?} [request_id: {}]",
                        self.base_url, attempt, attempts, delay, request.request_id
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "Request {} {} failed [request_id: {}]: {}",
                        request.method, request.path, request.request_id, e
                    );
                    return Err(map_transport_error(&e, request.request_id));
                }
            }
        }
    }

    /// Connection attempts allowed for a request
    fn attempts_for(&self, request: &ApiRequest) -> u32 {
        if request.retry_connect && request.method.is_idempotent() {
            self.max_attempts
        } else {
            1
        }
    }

    /// Turn a non-2xx response into a status error
    async fn reject_status(response: Response, request: &ApiRequest) -> ClientError {
        let status = response.status();
        let body = response.text().await.ok();
        warn!(
            "Request {} {} failed with status {} [request_id: {}]",
            request.method, request.path, status, request.request_id
        );
        map_http_error(status, body)
    }

    /// Check response size to prevent OOM
    fn check_content_length(&self, response: &Response) -> Result<(), ClientError> {
        if let Some(content_length) = response.content_length() {
            if content_length as usize > self.max_response_size {
                return Err(self.too_large(content_length as usize));
            }
        }
        Ok(())
    }

    fn too_large(&self, size: usize) -> ClientError {
        ClientError::Decode {
            message: format!(
                "Response size {} exceeds maximum {}",
                size, self.max_response_size
            ),
            preview: String::new(),
        }
    }

    /// Parse a response body into JSON; an empty body reads as `{}`
    fn parse_body(&self, bytes: &[u8], request: &ApiRequest) -> Result<Value, ClientError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(json!({}));
        }

        serde_json::from_slice(bytes).map_err(|e| {
            let preview: String = String::from_utf8_lossy(bytes)
                .chars()
                .take(PREVIEW_CHARS)
                .collect();
            error!(
                "Failed to parse response of {} {} [request_id: {}]: {}",
                request.method, request.path, request.request_id, e
            );
            ClientError::Decode {
                message: e.to_string(),
                preview,
            }
        })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn request(&self, request: ApiRequest) -> Result<Envelope, ClientError> {
        let response = self.send(&request).await?;

        let status = response.status();
        debug!("Response status: {} [request_id: {}]", status, request.request_id);

        if !status.is_success() {
            return Err(Self::reject_status(response, &request).await);
        }

        self.check_content_length(&response)?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(&e, request.request_id))?;

        // Check response size after reading
        if bytes.len() > self.max_response_size {
            return Err(self.too_large(bytes.len()));
        }

        let body = self.parse_body(&bytes, &request)?;
        debug!(
            response = ?redact_value(&body),
            request_id = %request.request_id,
            "Received API response"
        );

        Envelope::from_value(body)
    }

    async fn request_stream(&self, request: ApiRequest) -> Result<LineStream, ClientError> {
        let response = self.send(&request).await?;

        if !response.status().is_success() {
            return Err(Self::reject_status(response, &request).await);
        }

        info!(
            "Streaming response of {} {} [request_id: {}]",
            request.method, request.path, request.request_id
        );

        let request_id = request.request_id;
        let state = (
            response.bytes_stream().boxed(),
            Vec::new(),
            VecDeque::new(),
            false,
        );

        let lines = stream::unfold(state, move |(mut body, mut buffer, mut ready, mut done)| async move {
            loop {
                if let Some(line) = ready.pop_front() {
                    return Some((Ok(line), (body, buffer, ready, done)));
                }
                if done {
                    return None;
                }
                match body.next().await {
                    Some(Ok(chunk)) => {
                        buffer.extend_from_slice(&chunk);
                        ready.extend(split_lines(&mut buffer));
                    }
                    Some(Err(e)) => {
                        let err = map_transport_error(&e, request_id);
                        return Some((Err(err), (body, buffer, ready, true)));
                    }
                    None => {
                        done = true;
                        if !buffer.is_empty() {
                            let tail = String::from_utf8_lossy(&buffer).into_owned();
                            buffer.clear();
                            ready.push_back(tail);
                        }
                    }
                }
            }
        });

        Ok(Box::pin(lines))
    }
}
