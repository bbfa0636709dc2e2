//! Agent command - list agent instances.

use anyhow::Result;
use clap::{Args, Subcommand};
use openderisk_core::protocol::AgentAppPage;

use super::Context;
use crate::output::{emit, empty, field};

#[derive(Args)]
pub struct AgentArgs {
    #[command(subcommand)]
    command: AgentCommand,
}

#[derive(Subcommand)]
enum AgentCommand {
    /// List agent instances
    List {
        /// Page number
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Page size
        #[arg(short = 's', long, default_value_t = 100)]
        page_size: u32,
    },
}

pub async fn execute(args: AgentArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;

    match args.command {
        AgentCommand::List { page, page_size } => {
            let apps = client.list_apps(page, page_size).await?;
            emit(ctx.format(), &apps, app_lines)?;
        }
    }

    Ok(())
}

fn app_lines(page: &AgentAppPage) -> Vec<String> {
    if page.app_list.is_empty() {
        return empty("agents");
    }
    let mut lines = Vec::new();
    for app in &page.app_list {
        lines.push(format!(
            "{} ({})",
            app.app_name.as_deref().unwrap_or("-"),
            app.app_code.as_deref().unwrap_or("-")
        ));
        lines.extend(
            [
                field("Description", app.app_describe.as_deref()),
                field("Team Mode", app.team_mode.as_deref()),
                app.published
                    .map(|p| format!("  Published: {}", if p { "yes" } else { "no" })),
            ]
            .into_iter()
            .flatten(),
        );
    }
    lines.push(format!(
        "Page {}/{} ({} total)",
        page.current_page, page.total_page, page.total_count
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use openderisk_core::protocol::AgentApp;

    #[test]
    fn test_app_lines() {
        let page = AgentAppPage {
            total_count: 1,
            total_page: 1,
            current_page: 1,
            app_list: vec![AgentApp {
                app_code: Some("sre".to_string()),
                app_name: Some("SRE Agent".to_string()),
                published: Some(true),
                ..AgentApp::default()
            }],
            ..AgentAppPage::default()
        };
        assert_eq!(
            app_lines(&page),
            vec![
                "SRE Agent (sre)".to_string(),
                "  Published: yes".to_string(),
                "Page 1/1 (1 total)".to_string(),
            ]
        );
        assert_eq!(app_lines(&AgentAppPage::default()), vec!["No agents found".to_string()]);
    }
}
