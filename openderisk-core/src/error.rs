//! Client error taxonomy
//!
//! Every failure the client can produce surfaces as a [`ClientError`]. Each
//! variant carries a human message and, where it applies, the HTTP status,
//! the raw server payload and a remediation hint for the operator.

use crate::config::ConfigError;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Code the server reports while a freshly submitted chat session is not yet queryable
pub const SESSION_NOT_FOUND_CODE: &str = "E0103";

/// Errors surfaced by the transport, the chat protocol and the client facade
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection-level failure or per-request timeout
    #[error("Network error: {message}")]
    Network { message: String },

    /// Non-2xx HTTP status; `body` is the parsed JSON body or `{"text": raw}`
    #[error("API request failed: {status}")]
    Status { status: u16, body: Value },

    /// A success response whose body is not a valid envelope
    #[error("Server returned invalid JSON response")]
    Decode { message: String, preview: String },

    /// The server answered `success: false`, or omitted a required field
    #[error("{message}")]
    Api {
        message: String,
        code: Option<String>,
        response: Option<Value>,
    },

    /// The chat did not reach a final state within the polling budget
    #[error("Chat timed out")]
    Timeout { timeout: Duration },

    /// A request rejected before anything was sent
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Build an API error from a raw server response, picking up its `code`
    pub fn api(message: impl Into<String>, response: Value) -> Self {
        let code = response
            .get("code")
            .and_then(Value::as_str)
            .map(str::to_owned);
        Self::Api {
            message: message.into(),
            code,
            response: Some(response),
        }
    }

    /// Build a client-side validation error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// HTTP status code, when the failure came from a non-2xx response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw server payload attached to the failure
    pub fn response(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } => Some(body),
            Self::Api { response, .. } => response.as_ref(),
            _ => None,
        }
    }

    /// Server-reported error code, from either an envelope or an error body
    pub fn server_code(&self) -> Option<&str> {
        match self {
            Self::Api { code: Some(code), .. } => Some(code.as_str()),
            Self::Status { body, .. } => body.get("code").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Extra detail worth showing under the main message
    pub fn details(&self) -> Option<String> {
        match self {
            Self::Decode { message, preview } => {
                let preview = if preview.is_empty() { "empty" } else { preview };
                Some(format!("{} (response content: {})", message, preview))
            }
            Self::Status { body, .. } => body
                .get("err_msg")
                .or_else(|| body.get("text"))
                .and_then(Value::as_str)
                .map(str::to_owned),
            Self::Api { response, .. } => response
                .as_ref()
                .and_then(|r| r.get("err_msg"))
                .and_then(Value::as_str)
                .map(str::to_owned),
            _ => None,
        }
    }

    /// Remediation hint for the operator
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Network { .. } => {
                Some("Check your network connection and try again".to_string())
            }
            Self::Status { .. } => Some("Check your request parameters and try again".to_string()),
            Self::Decode { .. } => {
                Some("Please check if the server is running properly".to_string())
            }
            Self::Timeout { timeout } => Some(format!(
                "The chat did not complete within {} seconds.",
                timeout.as_secs()
            )),
            Self::Config(_) => {
                Some("Run `openderisk config show` to inspect the active configuration".to_string())
            }
            Self::Api { .. } | Self::InvalidRequest { .. } => None,
        }
    }

    /// Whether this is the overall polling timeout, which callers may choose to resubmit on
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the server reported the transient "session not found" code
    pub fn is_session_not_found(&self) -> bool {
        self.server_code() == Some(SESSION_NOT_FOUND_CODE)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode {
            message: err.to_string(),
            preview: String::new(),
        }
    }
}
