//! CLI command definitions.
//!
//! This module defines the command structure for the OpenDerisk CLI.
//! Each subcommand group maps to one resource on the platform.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use openderisk_core::config::{ConfigError, OpenDeriskConfig, OutputFormat};
use openderisk_core::OpenDeriskClient;

pub mod agent;
pub mod chat;
pub mod config;
pub mod mcp;

/// OpenDerisk - command-line client for the OpenDerisk AI platform
#[derive(Parser)]
#[command(name = "openderisk")]
#[command(version, about = "OpenDerisk - command-line client for the OpenDerisk AI platform")]
#[command(long_about = r#"
Command-line client for the OpenDerisk AI platform.

COMMANDS:
  chat    → Send messages, manage conversations, list models
  agent   → List agent instances
  mcp     → Manage MCP servers and run their tools
  config  → Create and inspect configuration

EXIT CODES:
  0   - Success
  1   - General error
  2   - Chat timed out
  130 - Interrupted
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, env = "OPENDERISK_CONFIG")]
    pub config: Option<PathBuf>,

    /// OpenDerisk platform base URL (overrides config)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Output format (overrides config)
    #[arg(long, global = true, value_enum)]
    pub output_format: Option<FormatArg>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chat with the platform and manage conversations
    Chat(chat::ChatArgs),

    /// Agent instance operations
    Agent(agent::AgentArgs),

    /// MCP server operations
    Mcp(mcp::McpArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Text,
    Table,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text | FormatArg::Table => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Resolved global options shared by every command
pub struct Context {
    config_path: Option<PathBuf>,
    base_url: Option<String>,
    output_format: Option<OutputFormat>,
    loaded: std::result::Result<OpenDeriskConfig, ConfigError>,
}

impl Context {
    pub fn new(cli: &Cli, loaded: std::result::Result<OpenDeriskConfig, ConfigError>) -> Self {
        Self {
            config_path: cli.config.clone(),
            base_url: cli.base_url.clone(),
            output_format: cli.output_format.map(OutputFormat::from),
            loaded,
        }
    }

    /// Explicit `--config` path, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// `--base-url` given on the command line
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Effective configuration with command-line overrides applied
    pub fn config(&self) -> Result<OpenDeriskConfig> {
        let mut config = self
            .loaded
            .as_ref()
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
            .clone();
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        Ok(config)
    }

    pub fn client(&self) -> Result<OpenDeriskClient> {
        let config = self.config()?;
        Ok(OpenDeriskClient::from_config(&config.api)?)
    }

    pub fn format(&self) -> OutputFormat {
        self.output_format
            .or_else(|| self.loaded.as_ref().ok().map(|c| c.defaults.output_format))
            .unwrap_or_default()
    }
}

/// Ask for confirmation on stdin unless `assume_yes` is set
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    use std::io::{BufRead, Write};

    if assume_yes {
        return Ok(true);
    }
    eprint!("{} [y/N]: ", prompt);
    std::io::stderr().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
