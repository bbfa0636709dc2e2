//! Chat command - send messages, manage conversations, list models.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};
use futures::StreamExt;
use openderisk_core::config::OutputFormat;
use openderisk_core::protocol::{ConversationInfo, ModelInfo};
use openderisk_core::{collect_text, ChatOptions, ChatRequest};
use serde_json::json;
use tracing::info;

use super::{confirm, Context};
use crate::output::{emit, empty, field};

#[derive(Args)]
pub struct ChatArgs {
    #[command(subcommand)]
    command: ChatCommand,
}

#[derive(Subcommand)]
enum ChatCommand {
    /// Send a message and print the answer
    Send(SendArgs),

    /// List conversations
    List(ListArgs),

    /// Delete a conversation
    Delete {
        /// Conversation UID
        conv_uid: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List available models
    Models,

    /// Stop a running chat
    Stop {
        /// Conversation session ID
        conv_session_id: String,
    },
}

#[derive(Args)]
struct SendArgs {
    /// Message to send
    message: String,

    /// Conversation UID (continue an existing conversation)
    #[arg(short, long = "conv")]
    conv_uid: Option<String>,

    /// Model name
    #[arg(short, long = "model")]
    model_name: Option<String>,

    /// App (agent) code
    #[arg(short, long = "app")]
    app_code: Option<String>,

    /// User name sent with the request
    #[arg(short, long = "user")]
    user_name: Option<String>,

    #[arg(long)]
    temperature: Option<f32>,

    #[arg(long = "max-tokens")]
    max_new_tokens: Option<u32>,

    /// Seconds to wait for the answer
    #[arg(short, long, default_value_t = 300)]
    timeout: u64,

    /// "Session not found" answers tolerated right after submission
    #[arg(long, default_value_t = 10)]
    max_retries: u32,
}

impl SendArgs {
    fn request(&self) -> ChatRequest {
        let mut request = ChatRequest::text(self.message.clone());
        if let Some(conv_uid) = &self.conv_uid {
            request = request.with_conv_uid(conv_uid.clone());
        }
        if let Some(model) = &self.model_name {
            request = request.with_model(model.clone());
        }
        if let Some(app_code) = &self.app_code {
            request = request.with_app_code(app_code.clone());
        }
        if let Some(user_name) = &self.user_name {
            request = request.with_user_name(user_name.clone());
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_new_tokens) = self.max_new_tokens {
            request = request.with_max_new_tokens(max_new_tokens);
        }
        request
    }

    fn options(&self) -> ChatOptions {
        ChatOptions::default()
            .with_timeout(Duration::from_secs(self.timeout))
            .with_max_transient_retries(self.max_retries)
    }
}

#[derive(Args)]
struct ListArgs {
    /// Page number
    #[arg(short, long, default_value_t = 1)]
    page: u32,

    /// Page size
    #[arg(short = 's', long, default_value_t = 20)]
    page_size: u32,

    /// Only conversations of this user
    #[arg(short, long = "user")]
    user_name: Option<String>,
}

pub async fn execute(args: ChatArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let format = ctx.format();

    match args.command {
        ChatCommand::Send(send) => {
            let chunks = client.chat_completions(send.request(), send.options());
            match format {
                OutputFormat::Json => {
                    let answer = collect_text(chunks).await?;
                    emit(format, &json!({ "answer": answer }), |_| Vec::new())?;
                }
                OutputFormat::Text => {
                    let mut chunks = chunks;
                    let mut stdout = std::io::stdout();
                    while let Some(chunk) = chunks.next().await {
                        write!(stdout, "{}", chunk?)?;
                        stdout.flush()?;
                    }
                    writeln!(stdout)?;
                }
            }
        }
        ChatCommand::List(list) => {
            let conversations = client
                .list_conversations(list.user_name.as_deref(), list.page, list.page_size)
                .await?;
            emit(format, &conversations, |c| conversation_lines(c))?;
        }
        ChatCommand::Delete { conv_uid, yes } => {
            if !confirm("Are you sure you want to delete this conversation?", yes)? {
                println!("Aborted");
                return Ok(());
            }
            if client.delete_conversation(&conv_uid).await? {
                println!("Deleted conversation: {}", conv_uid);
            } else {
                anyhow::bail!("Failed to delete conversation: {}", conv_uid);
            }
        }
        ChatCommand::Models => {
            let models = client.list_models().await?;
            info!("{} healthy models", models.len());
            emit(format, &models, |m| model_lines(m))?;
        }
        ChatCommand::Stop { conv_session_id } => {
            if client.stop_chat(&conv_session_id).await? {
                println!("Stopped chat: {}", conv_session_id);
            } else {
                anyhow::bail!("Failed to stop chat: {}", conv_session_id);
            }
        }
    }

    Ok(())
}

fn conversation_lines(conversations: &[ConversationInfo]) -> Vec<String> {
    if conversations.is_empty() {
        return empty("conversations");
    }
    let mut lines = Vec::new();
    for conv in conversations {
        lines.push(conv.conv_uid.clone());
        lines.extend(
            [
                field("User Input", conv.user_input.as_deref()),
                field("App Code", conv.app_code.as_deref()),
                field("Created", conv.gmt_created.as_deref()),
            ]
            .into_iter()
            .flatten(),
        );
    }
    lines
}

fn model_lines(models: &[ModelInfo]) -> Vec<String> {
    if models.is_empty() {
        return empty("models");
    }
    models.iter().map(|m| m.model_name.clone()).collect()
}
