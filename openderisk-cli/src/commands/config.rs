//! Config command - create and inspect configuration.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use openderisk_core::config::{
    self as core_config, global_config_path, local_config_path, ConfigValidator,
    OpenDeriskConfig, OutputFormat,
};
use serde_json::Value;
use tracing::debug;

use super::Context;
use crate::output::emit;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write a configuration file with default values (and `--base-url`, if given)
    Init {
        /// Write the per-user file instead of the project file
        #[arg(long)]
        global: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show,

    /// Print one value (e.g. `api.base_url`)
    Get { key: String },

    /// Set one value in a configuration file
    Set {
        key: String,
        value: String,

        /// Edit the per-user file instead of the project file
        #[arg(long)]
        global: bool,
    },
}

pub async fn execute(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Init { global, force } => {
            let path = target_path(ctx, global)?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }

            let mut config = OpenDeriskConfig::default();
            if let Some(base_url) = ctx.base_url() {
                config.api.base_url = base_url.to_string();
            }
            ConfigValidator::new().validate(&config)?;

            core_config::save_config(&config, &path)?;
            println!("Configuration created at: {}", path.display());
        }
        ConfigCommand::Show => {
            let config = ctx.config()?;
            emit(ctx.format(), &config, show_lines)?;
        }
        ConfigCommand::Get { key } => {
            let config = ctx.config()?;
            let value = config
                .get(&key)
                .ok_or_else(|| anyhow!("Key '{}' not found", key))?;
            match ctx.format() {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
                OutputFormat::Text => println!("{}", display_value(&value)),
            }
        }
        ConfigCommand::Set { key, value, global } => {
            let path = target_path(ctx, global)?;
            let mut config = if path.exists() {
                core_config::load_from_yaml(&path)?
            } else {
                OpenDeriskConfig::default()
            };

            let parsed = config.set_from_str(&key, &value)?;
            ConfigValidator::new().validate(&config)?;
            core_config::save_config(&config, &path)?;
            debug!("Updated {} in {}", key, path.display());
            println!("Set {} = {}", key, display_value(&parsed));
        }
    }

    Ok(())
}

/// File a write goes to: `--config`, else the global or the project file
fn target_path(ctx: &Context, global: bool) -> Result<PathBuf> {
    if let Some(path) = ctx.config_path() {
        return Ok(path.to_path_buf());
    }
    if global {
        global_config_path().ok_or_else(|| anyhow!("Cannot locate the home directory"))
    } else {
        Ok(local_config_path())
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn show_lines(config: &OpenDeriskConfig) -> Vec<String> {
    vec![
        "API Configuration:".to_string(),
        format!("  Base URL: {}", config.api.base_url),
        format!("  Timeout: {}", config.api.timeout),
        format!("  Retry Attempts: {}", config.api.retry_max_attempts),
        String::new(),
        "Defaults:".to_string(),
        format!(
            "  Output Format: {}",
            display_value(&serde_json::json!(config.defaults.output_format))
        ),
        String::new(),
        "Logging:".to_string(),
        format!("  Level: {}", config.logging.level),
    ]
}
