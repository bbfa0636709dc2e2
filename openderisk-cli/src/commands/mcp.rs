//! MCP command - manage MCP servers and run their tools.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand, ValueEnum};
use openderisk_core::protocol::{McpCreateRequest, McpKind, McpServer, McpTool};
use openderisk_core::McpEndpoint;
use serde_json::{Map, Value};

use super::Context;
use crate::output::{emit, empty, field};

#[derive(Args)]
pub struct McpArgs {
    #[command(subcommand)]
    command: McpCommand,
}

#[derive(Subcommand)]
enum McpCommand {
    /// List MCP servers
    List(PageArgs),

    /// Search MCP servers by name or description
    Search {
        /// Text to match
        filter: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Register an MCP server
    Create(CreateArgs),

    /// Delete an MCP server
    Delete {
        /// MCP server code
        mcp_code: String,
    },

    /// List the tools of an MCP server
    Tools {
        /// MCP server name
        name: String,

        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Run one tool of an MCP server
    Exec(ExecArgs),
}

#[derive(Args)]
struct PageArgs {
    /// Page number
    #[arg(short, long, default_value_t = 1)]
    page: u32,

    /// Page size
    #[arg(short = 's', long, default_value_t = 20)]
    page_size: u32,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Sse,
    Stdio,
}

impl From<KindArg> for McpKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Sse => McpKind::Sse,
            KindArg::Stdio => McpKind::Stdio,
        }
    }
}

#[derive(Args)]
struct CreateArgs {
    /// MCP server name
    #[arg(short, long)]
    name: String,

    /// Transport the platform uses to reach the server
    #[arg(short = 't', long = "type", value_enum, default_value = "sse")]
    kind: KindArg,

    #[arg(short, long)]
    description: Option<String>,

    /// SSE URL (for SSE type)
    #[arg(long)]
    sse_url: Option<String>,

    /// Stdio command (for stdio type)
    #[arg(long)]
    stdio_cmd: Option<String>,

    /// SSE headers as a JSON object
    #[arg(long)]
    sse_headers: Option<String>,

    /// Token for authentication
    #[arg(long)]
    token: Option<String>,

    #[arg(long)]
    author: Option<String>,

    #[arg(long)]
    email: Option<String>,

    /// Server version
    #[arg(long = "server-version")]
    server_version: Option<String>,

    #[arg(long)]
    category: Option<String>,
}

impl CreateArgs {
    fn request(&self) -> Result<McpCreateRequest> {
        let mut request = McpCreateRequest::new(self.name.clone(), self.kind.into());
        if let Some(description) = &self.description {
            request = request.with_description(description.clone());
        }
        if let Some(url) = &self.sse_url {
            request = request.with_sse_url(url.clone());
        }
        if let Some(cmd) = &self.stdio_cmd {
            request = request.with_stdio_cmd(cmd.clone());
        }
        if let Some(headers) = parse_headers(self.sse_headers.as_deref())? {
            request = request.with_sse_headers(headers);
        }
        if let Some(token) = &self.token {
            request = request.with_token(token.clone());
        }
        if let Some(author) = &self.author {
            request = request.with_author(author.clone());
        }
        if let Some(email) = &self.email {
            request = request.with_email(email.clone());
        }
        if let Some(version) = &self.server_version {
            request = request.with_version(version.clone());
        }
        if let Some(category) = &self.category {
            request = request.with_category(category.clone());
        }
        Ok(request)
    }
}

#[derive(Args)]
struct EndpointArgs {
    /// SSE URL, for servers the platform has not registered
    #[arg(long)]
    sse_url: Option<String>,

    /// SSE headers as a JSON object
    #[arg(long)]
    sse_headers: Option<String>,
}

#[derive(Args)]
struct ExecArgs {
    /// MCP server name
    #[arg(short, long)]
    mcp_name: String,

    /// Tool name
    #[arg(short, long)]
    tool_name: String,

    /// Tool arguments as a JSON object
    #[arg(short, long, conflicts_with = "params_file")]
    params: Option<String>,

    /// File holding the tool arguments as a JSON object
    #[arg(long)]
    params_file: Option<PathBuf>,

    #[command(flatten)]
    endpoint: EndpointArgs,
}

impl ExecArgs {
    fn arguments(&self) -> Result<Map<String, Value>> {
        let raw = match (&self.params_file, &self.params) {
            (Some(path), _) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            (None, Some(params)) => params.clone(),
            (None, None) => return Ok(Map::new()),
        };
        let value: Value = serde_json::from_str(&raw).context("Invalid JSON parameters")?;
        match value {
            Value::Object(map) => Ok(map),
            other => anyhow::bail!("Tool parameters must be a JSON object, got {}", other),
        }
    }
}

fn parse_headers(raw: Option<&str>) -> Result<Option<HashMap<String, String>>> {
    raw.map(|raw| serde_json::from_str(raw).context("Invalid JSON for sse-headers"))
        .transpose()
}

pub async fn execute(args: McpArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let format = ctx.format();

    match args.command {
        McpCommand::List(page) => {
            let servers = client.list_mcp_servers(page.page, page.page_size).await?;
            emit(format, &servers, |s| server_lines(s))?;
        }
        McpCommand::Search { filter, page } => {
            let servers = client
                .search_mcp_servers(&filter, page.page, page.page_size)
                .await?;
            emit(format, &servers, |s| server_lines(s))?;
        }
        McpCommand::Create(create) => {
            let server = client.create_mcp_server(&create.request()?).await?;
            emit(format, &server, |s| {
                let mut lines = vec![format!("Created MCP server: {}", s.name)];
                lines.push(format!("  MCP Code: {}", s.mcp_code));
                lines.extend(field("Description", s.description.as_deref()));
                lines
            })?;
        }
        McpCommand::Delete { mcp_code } => {
            if client.delete_mcp_server(&mcp_code).await? {
                println!("Deleted MCP server: {}", mcp_code);
            } else {
                anyhow::bail!("Failed to delete MCP server: {}", mcp_code);
            }
        }
        McpCommand::Tools { name, endpoint } => {
            let headers = parse_headers(endpoint.sse_headers.as_deref())?;
            let endpoint = McpEndpoint {
                sse_url: endpoint.sse_url.as_deref(),
                sse_headers: headers.as_ref(),
            };
            let tools = client.list_mcp_tools(&name, &endpoint).await?;
            emit(format, &tools, |t| tool_lines(t))?;
        }
        McpCommand::Exec(exec) => {
            let arguments = exec.arguments()?;
            let headers = parse_headers(exec.endpoint.sse_headers.as_deref())?;
            let endpoint = McpEndpoint {
                sse_url: exec.endpoint.sse_url.as_deref(),
                sse_headers: headers.as_ref(),
            };
            let result = client
                .run_mcp_tool(&exec.mcp_name, &exec.tool_name, arguments, &endpoint)
                .await?;
            emit(format, &result, |r| {
                let mut lines = vec!["Success".to_string()];
                if !r.is_null() {
                    lines.push(serde_json::to_string_pretty(r).unwrap_or_else(|_| r.to_string()));
                }
                lines
            })?;
        }
    }

    Ok(())
}

fn server_lines(servers: &[McpServer]) -> Vec<String> {
    if servers.is_empty() {
        return empty("MCP servers");
    }
    let mut lines = Vec::new();
    for server in servers {
        lines.push(format!("{} ({})", server.name, server.mcp_code));
        lines.extend(
            [
                field("Type", server.mcp_type.as_deref()),
                field("Description", server.description.as_deref()),
                field("SSE URL", server.sse_url.as_deref()),
                field("Command", server.stdio_cmd.as_deref()),
            ]
            .into_iter()
            .flatten(),
        );
    }
    lines
}

fn tool_lines(tools: &[McpTool]) -> Vec<String> {
    if tools.is_empty() {
        return empty("tools");
    }
    tools
        .iter()
        .map(|tool| match tool.description.as_deref() {
            Some(description) if !description.is_empty() => {
                format!("{}: {}", tool.name, description)
            }
            _ => tool.name.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands};
    use clap::Parser;
    use serde_json::json;

    fn command(args: &[&str]) -> McpCommand {
        match Cli::parse_from(args).command {
            Commands::Mcp(McpArgs { command }) => command,
            _ => panic!("expected mcp command"),
        }
    }

    #[test]
    fn test_create_request_from_flags() {
        let create = match command(&[
            "openderisk",
            "mcp",
            "create",
            "-n",
            "weather",
            "-t",
            "stdio",
            "--stdio-cmd",
            "python server.py",
            "--sse-headers",
            r#"{"X-Key": "v"}"#,
        ]) {
            McpCommand::Create(create) => create,
            _ => panic!("expected create"),
        };

        let request = create.request().unwrap();
        assert_eq!(request.kind, McpKind::Stdio);
        assert_eq!(request.stdio_cmd.as_deref(), Some("python server.py"));
        assert_eq!(request.sse_headers.unwrap()["X-Key"], "v");
    }

    #[test]
    fn test_exec_arguments_must_be_an_object() {
        let exec = match command(&[
            "openderisk", "mcp", "exec", "-m", "weather", "-t", "forecast", "-p", r#"{"city": "Paris"}"#,
        ]) {
            McpCommand::Exec(exec) => exec,
            _ => panic!("expected exec"),
        };
        assert_eq!(exec.arguments().unwrap()["city"], json!("Paris"));

        let bad = match command(&[
            "openderisk", "mcp", "exec", "-m", "weather", "-t", "forecast", "-p", "[1]",
        ]) {
            McpCommand::Exec(exec) => exec,
            _ => panic!("expected exec"),
        };
        assert!(bad.arguments().is_err());
    }

    #[test]
    fn test_invalid_headers_are_rejected() {
        assert!(parse_headers(Some("not json")).is_err());
        assert!(parse_headers(None).unwrap().is_none());
    }
}
