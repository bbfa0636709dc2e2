//! MCP server and tool operations

use super::{decode, decode_list, failure_message, success_data, OpenDeriskClient};
use crate::error::ClientError;
use crate::http::ApiRequest;
use crate::protocol::{Envelope, McpCreateRequest, McpServer, McpTool};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::info;

const QUERY_FUZZY_PATH: &str = "/api/v1/serve/mcp/query_fuzzy";

/// Where the platform should reach a server that is not registered yet
#[derive(Debug, Clone, Default)]
pub struct McpEndpoint<'a> {
    pub sse_url: Option<&'a str>,
    pub sse_headers: Option<&'a HashMap<String, String>>,
}

impl McpEndpoint<'_> {
    fn extend(&self, body: &mut Value) {
        if let Some(url) = self.sse_url.filter(|u| !u.is_empty()) {
            body["sse_url"] = json!(url);
        }
        if let Some(headers) = self.sse_headers.filter(|h| !h.is_empty()) {
            body["sse_headers"] = json!(headers);
        }
    }
}

/// Server list in either of the shapes the platform returns: a bare list or `{items: [...]}`
fn server_items(envelope: Envelope) -> Result<Vec<McpServer>, ClientError> {
    let servers = match success_data(envelope, "Failed to list MCP servers")? {
        Some(Value::Object(mut page)) => page.remove("items").map(decode_list),
        Some(data) => Some(decode_list(data)),
        None => None,
    };
    Ok(servers.unwrap_or_default())
}

impl OpenDeriskClient {
    /// One page of registered MCP servers
    pub async fn list_mcp_servers(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<McpServer>, ClientError> {
        self.query_mcp_servers(json!({}), page, page_size).await
    }

    /// MCP servers whose fields fuzzily match `filter`
    pub async fn search_mcp_servers(
        &self,
        filter: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<McpServer>, ClientError> {
        self.query_mcp_servers(json!({ "filter": filter }), page, page_size)
            .await
    }

    async fn query_mcp_servers(
        &self,
        body: Value,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<McpServer>, ClientError> {
        let request = ApiRequest::post(QUERY_FUZZY_PATH)
            .with_body(body)
            .with_query("page", page)
            .with_query("page_size", page_size);
        server_items(self.transport.request(request).await?)
    }

    /// Details of one MCP server, if it exists
    pub async fn get_mcp_server(&self, mcp_code: &str) -> Result<Option<McpServer>, ClientError> {
        let request =
            ApiRequest::post("/api/v1/serve/mcp/query").with_body(json!({ "mcp_code": mcp_code }));
        let envelope = self.transport.request(request).await?;
        success_data(envelope, "Failed to get MCP server")?
            .map(decode)
            .transpose()
    }

    /// Register a new MCP server
    pub async fn create_mcp_server(
        &self,
        server: &McpCreateRequest,
    ) -> Result<McpServer, ClientError> {
        server.validate()?;

        let request = ApiRequest::post("/api/v1/serve/mcp/create").with_json(server)?;
        let envelope = self.transport.request(request).await?;
        if let Some(data) = envelope.data() {
            let created: McpServer = decode(data.clone())?;
            info!("Created MCP server {} ({})", created.name, created.mcp_code);
            return Ok(created);
        }

        let message = failure_message(&envelope, "Failed to create MCP server");
        Err(ClientError::api(message, envelope.to_value()))
    }

    /// Remove an MCP server; `false` when the server refused
    pub async fn delete_mcp_server(&self, mcp_code: &str) -> Result<bool, ClientError> {
        let request =
            ApiRequest::post("/api/v1/serve/mcp/delete").with_body(json!({ "mcp_code": mcp_code }));
        Ok(self.transport.request(request).await?.is_success())
    }

    /// Tools exposed by an MCP server
    pub async fn list_mcp_tools(
        &self,
        name: &str,
        endpoint: &McpEndpoint<'_>,
    ) -> Result<Vec<McpTool>, ClientError> {
        let mut body = json!({ "name": name });
        endpoint.extend(&mut body);

        let request = ApiRequest::post("/api/v1/serve/mcp/tool/list").with_body(body);
        let envelope = self.transport.request(request).await?;
        Ok(success_data(envelope, "Failed to list MCP tools")?
            .map(decode_list)
            .unwrap_or_default())
    }

    /// Invoke one tool and return its raw result
    pub async fn run_mcp_tool(
        &self,
        name: &str,
        tool_name: &str,
        arguments: Map<String, Value>,
        endpoint: &McpEndpoint<'_>,
    ) -> Result<Value, ClientError> {
        let mut body = json!({
            "name": name,
            "params": {
                "name": tool_name,
                "arguments": arguments,
            },
        });
        endpoint.extend(&mut body);

        let request = ApiRequest::post("/api/v1/serve/mcp/tool/run").with_body(body);
        match self.transport.request(request).await? {
            Envelope::Success { data } => Ok(data),
            failure => {
                let message = failure_message(&failure, "Failed to run tool");
                Err(ClientError::api(message, failure.to_value()))
            }
        }
    }
}
