//! MCP (tool server) types

use crate::config::SecretString;
use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// How the platform connects to an MCP server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpKind {
    Sse,
    Stdio,
}

/// A registered MCP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServer {
    pub mcp_code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub mcp_type: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub stdio_cmd: Option<String>,
    #[serde(default)]
    pub sse_url: Option<String>,
    #[serde(default)]
    pub sse_headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub token: Option<SecretString>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub installed: Option<i64>,
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default)]
    pub server_ips: Option<String>,
    #[serde(default)]
    pub gmt_created: Option<String>,
    #[serde(default)]
    pub gmt_modified: Option<String>,
}

/// Body of an MCP server registration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct McpCreateRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: McpKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sse_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdio_cmd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sse_headers: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<SecretString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

const MAX_FIELD_LEN: usize = 255;

impl McpCreateRequest {
    pub fn new(name: impl Into<String>, kind: McpKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            sse_url: None,
            stdio_cmd: None,
            sse_headers: None,
            token: None,
            author: None,
            email: None,
            version: None,
            category: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_sse_url(mut self, url: impl Into<String>) -> Self {
        self.sse_url = Some(url.into());
        self
    }

    pub fn with_stdio_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.stdio_cmd = Some(cmd.into());
        self
    }

    pub fn with_sse_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.sse_headers = Some(headers);
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::new(token.into()));
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Length limits the server enforces
    pub fn validate(&self) -> Result<(), ClientError> {
        let name_len = self.name.chars().count();
        if name_len == 0 || name_len > MAX_FIELD_LEN {
            return Err(ClientError::invalid_request(format!(
                "MCP name must be 1 to {} characters",
                MAX_FIELD_LEN
            )));
        }
        if matches!(&self.description, Some(d) if d.is_empty()) {
            return Err(ClientError::invalid_request(
                "MCP description must not be empty",
            ));
        }
        for (field, value) in [
            ("author", &self.author),
            ("email", &self.email),
            ("version", &self.version),
        ] {
            if matches!(value, Some(v) if v.chars().count() > MAX_FIELD_LEN) {
                return Err(ClientError::invalid_request(format!(
                    "MCP {} must be at most {} characters",
                    field, MAX_FIELD_LEN
                )));
            }
        }
        Ok(())
    }
}

/// A tool exposed by an MCP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub param_schema: Option<Value>,
}
