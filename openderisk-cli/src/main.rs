//! OpenDerisk CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Chat timed out
//! - 130: Interrupted (Ctrl-C)

use std::process::ExitCode;

use clap::Parser;
use openderisk_core::config::{self, OpenDeriskConfig};
use openderisk_core::ClientError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod output;

use commands::{Cli, Commands, Context};

/// Process exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const TIMEOUT: u8 = 2;
    pub const INTERRUPTED: u8 = 130;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A broken config file must not stop `config init` from repairing it
    let loaded = config::get_config(cli.config.as_deref());
    let level = log_level(cli.verbose, loaded.as_ref().ok());
    init_logging(level);

    let ctx = Context::new(&cli, loaded);

    let run = async {
        match cli.command {
            Commands::Chat(args) => commands::chat::execute(args, &ctx).await,
            Commands::Agent(args) => commands::agent::execute(args, &ctx).await,
            Commands::Mcp(args) => commands::mcp::execute(args, &ctx).await,
            Commands::Config(args) => commands::config::execute(args, &ctx).await,
        }
    };

    let result = tokio::select! {
        result = run => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted");
            return ExitCode::from(ExitCodes::INTERRUPTED);
        }
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            report_error(&e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

/// `-v` raises to info, `-vv` to debug; otherwise the configured level
fn log_level(verbose: u8, config: Option<&OpenDeriskConfig>) -> String {
    match verbose {
        0 => config
            .map(|c| c.logging.level.to_lowercase())
            .unwrap_or_else(|| "warn".to_string()),
        1 => "info".to_string(),
        _ => "debug".to_string(),
    }
}

fn init_logging(level: String) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A subscriber installed earlier wins
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn report_error(e: &anyhow::Error) {
    eprintln!("Error: {:#}", e);
    if let Some(client_error) = e.downcast_ref::<ClientError>() {
        if let Some(details) = client_error.details() {
            eprintln!("Details: {}", details);
        }
        if let Some(suggestion) = client_error.suggestion() {
            eprintln!("Suggestion: {}", suggestion);
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<ClientError>() {
        Some(err) if err.is_timeout() => ExitCodes::TIMEOUT,
        _ => ExitCodes::GENERAL_ERROR,
    }
}
