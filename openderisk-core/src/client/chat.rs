//! Chat, conversation and model operations

use super::{decode_list, success_data, OpenDeriskClient};
use crate::chat::{collect_text, ChatOptions, ChatSession, ChunkStream};
use crate::error::ClientError;
use crate::http::ApiRequest;
use crate::protocol::{ChatRequest, ConversationInfo, ModelInfo};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, warn};

impl OpenDeriskClient {
    /// Submit a chat and stream its answer
    pub fn chat_completions(&self, request: ChatRequest, options: ChatOptions) -> ChunkStream {
        ChatSession::submit_and_wait(self.transport.clone(), request, options)
    }

    /// Submit a chat and wait for the whole answer
    pub async fn chat(
        &self,
        request: ChatRequest,
        options: ChatOptions,
    ) -> Result<String, ClientError> {
        collect_text(self.chat_completions(request, options)).await
    }

    /// List stored conversations, optionally for one user
    pub async fn list_conversations(
        &self,
        user_name: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ConversationInfo>, ClientError> {
        let mut request = ApiRequest::get("/api/v1/chat/dialogue/list")
            .with_query("page", page)
            .with_query("page_size", page_size);
        if let Some(user_name) = user_name.filter(|u| !u.is_empty()) {
            request = request.with_query("user_name", user_name);
        }

        let envelope = self.transport.request(request).await?;
        Ok(success_data(envelope, "Failed to list conversations")?
            .map(decode_list)
            .unwrap_or_default())
    }

    /// Delete a conversation; `false` when the server refused
    pub async fn delete_conversation(&self, conv_uid: &str) -> Result<bool, ClientError> {
        let request = ApiRequest::post("/api/v1/chat/dialogue/delete").with_query("con_uid", conv_uid);
        let deleted = self.transport.request(request).await?.is_success();
        if deleted {
            info!("Deleted conversation {}", conv_uid);
        }
        Ok(deleted)
    }

    /// Healthy models, one entry per model name in server order
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ClientError> {
        let request = ApiRequest::get("/api/v2/serve/model/models");
        let envelope = self.transport.request(request).await?;
        let items = match success_data(envelope, "Failed to list models")? {
            Some(Value::Array(items)) => items,
            _ => return Ok(Vec::new()),
        };

        let mut seen = HashSet::new();
        let mut models = Vec::new();
        for item in items {
            if item.get("healthy").and_then(Value::as_bool) != Some(true) {
                continue;
            }
            let name = match item.get("model_name").and_then(Value::as_str) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => continue,
            };
            if seen.contains(&name) {
                continue;
            }
            match serde_json::from_value::<ModelInfo>(item) {
                Ok(model) => {
                    seen.insert(name);
                    models.push(model);
                }
                Err(e) => warn!("Skipping model {}: {}", name, e),
            }
        }
        Ok(models)
    }

    /// Ask the server to stop a running chat
    pub async fn stop_chat(&self, conv_session_id: &str) -> Result<bool, ClientError> {
        let request =
            ApiRequest::post("/api/v1/chat/stop").with_query("conv_session_id", conv_session_id);
        Ok(self.transport.request(request).await?.is_success())
    }
}
