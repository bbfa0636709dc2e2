//! Chat request and response types
//!
//! Wire names follow the OpenDerisk server exactly (`conv_uid`, `user_input`,
//! `max_new_tokens`, ...). [`ChatRequest`] serializes through a private wire
//! struct so the `work_mode` tag can never be dropped or overridden.

use crate::error::ClientError;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Work mode tag sent with every chat submission
pub const ASYNC_WORK_MODE: &str = "async";

/// User name sent when the caller does not supply one
pub const DEFAULT_USER_NAME: &str = "cli_user";

/// Role of a message in a structured conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One entry of an OpenAI-compatible message list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,

    pub content: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// What drives the conversation: a plain prompt or a structured message list
#[derive(Debug, Clone, PartialEq)]
pub enum ChatInput {
    Text(String),
    Messages(Vec<Message>),
}

/// A chat job submission
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub input: ChatInput,

    /// Existing conversation to continue
    pub conv_uid: Option<String>,

    /// Agent (app) to route the chat to
    pub app_code: Option<String>,

    pub model_name: Option<String>,

    /// Passed through untouched; the server validates it
    pub temperature: Option<f32>,

    pub max_new_tokens: Option<u32>,

    pub incremental: bool,

    pub user_name: String,

    pub ext_info: Map<String, Value>,
}

impl ChatRequest {
    fn with_input(input: ChatInput) -> Self {
        Self {
            input,
            conv_uid: None,
            app_code: None,
            model_name: None,
            temperature: None,
            max_new_tokens: None,
            incremental: true,
            user_name: DEFAULT_USER_NAME.to_string(),
            ext_info: Map::new(),
        }
    }

    /// Request driven by a plain prompt
    pub fn text(prompt: impl Into<String>) -> Self {
        Self::with_input(ChatInput::Text(prompt.into()))
    }

    /// Request driven by a structured message list
    pub fn messages(messages: Vec<Message>) -> Self {
        Self::with_input(ChatInput::Messages(messages))
    }

    pub fn with_conv_uid(mut self, conv_uid: impl Into<String>) -> Self {
        self.conv_uid = Some(conv_uid.into());
        self
    }

    pub fn with_app_code(mut self, app_code: impl Into<String>) -> Self {
        self.app_code = Some(app_code.into());
        self
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.max_new_tokens = Some(max_new_tokens);
        self
    }

    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = user_name.into();
        self
    }

    pub fn with_ext_info(mut self, key: impl Into<String>, value: Value) -> Self {
        self.ext_info.insert(key.into(), value);
        self
    }

    /// Reject requests with nothing to say
    pub fn validate(&self) -> Result<(), ClientError> {
        match &self.input {
            ChatInput::Text(text) if text.trim().is_empty() => {
                Err(ClientError::invalid_request("chat input must not be empty"))
            }
            ChatInput::Messages(messages) if messages.is_empty() => {
                Err(ClientError::invalid_request("message list must not be empty"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Serialize)]
struct SubmitPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    conv_uid: Option<&'a str>,
    user_input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    messages: Option<&'a [Message]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_code: Option<&'a str>,
    user_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_new_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_name: Option<&'a str>,
    incremental: bool,
    ext_info: &'a Map<String, Value>,
    work_mode: &'static str,
}

impl Serialize for ChatRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (user_input, messages) = match &self.input {
            ChatInput::Text(text) => (text.as_str(), None),
            ChatInput::Messages(messages) => ("", Some(messages.as_slice())),
        };

        SubmitPayload {
            conv_uid: self.conv_uid.as_deref(),
            user_input,
            messages,
            app_code: self.app_code.as_deref(),
            user_name: &self.user_name,
            temperature: self.temperature,
            max_new_tokens: self.max_new_tokens,
            model_name: self.model_name.as_deref(),
            incremental: self.incremental,
            ext_info: &self.ext_info,
            work_mode: ASYNC_WORK_MODE,
        }
        .serialize(serializer)
    }
}

/// `data` section of a chat submission response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitAck {
    #[serde(default)]
    pub conv_id: Option<String>,
}

impl SubmitAck {
    /// Non-empty conversation id carried by a submission response
    pub fn conv_id_from(data: &Value) -> Option<String> {
        serde_json::from_value::<SubmitAck>(data.clone())
            .ok()
            .and_then(|ack| ack.conv_id)
            .filter(|id| !id.is_empty())
    }
}

/// `data` section of a chat status poll
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatStatus {
    #[serde(default)]
    pub is_final: bool,

    #[serde(default)]
    pub user_answer: Option<String>,
}

impl ChatStatus {
    /// Answer text, if any was produced
    pub fn answer(&self) -> Option<&str> {
        self.user_answer.as_deref().filter(|a| !a.is_empty())
    }
}

/// A stored conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationInfo {
    pub conv_uid: String,
    #[serde(default)]
    pub user_input: Option<String>,
    #[serde(default)]
    pub chat_mode: Option<String>,
    #[serde(default)]
    pub app_code: Option<String>,
    #[serde(default)]
    pub select_param: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub sys_code: Option<String>,
    #[serde(default)]
    pub gmt_created: Option<String>,
    #[serde(default)]
    pub gmt_modified: Option<String>,
}

/// A model worker registered with the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_name: String,
    #[serde(default)]
    pub worker_type: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub healthy: Option<bool>,
    #[serde(default)]
    pub last_heartbeat: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_request_payload() {
        let request = ChatRequest::text("Hello");
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "user_input": "Hello",
                "user_name": "cli_user",
                "incremental": true,
                "ext_info": {},
                "work_mode": "async"
            })
        );
    }

    #[test]
    fn test_full_request_payload() {
        let request = ChatRequest::text("Hi")
            .with_conv_uid("conv-1")
            .with_app_code("app-1")
            .with_model("gpt-4")
            .with_temperature(0.5)
            .with_max_new_tokens(1024)
            .with_user_name("alice");
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["conv_uid"], "conv-1");
        assert_eq!(body["app_code"], "app-1");
        assert_eq!(body["model_name"], "gpt-4");
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["max_new_tokens"], 1024);
        assert_eq!(body["user_name"], "alice");
        assert_eq!(body["work_mode"], "async");
    }

    #[test]
    fn test_messages_request_payload() {
        let request = ChatRequest::messages(vec![
            Message::system("Be brief"),
            Message::user("What is SRE?"),
        ]);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["user_input"], "");
        assert_eq!(
            body["messages"],
            json!([
                {"role": "system", "content": "Be brief"},
                {"role": "user", "content": "What is SRE?"}
            ])
        );
    }

    #[test]
    fn test_validate_rejects_empty_input() {
        assert!(ChatRequest::text("   ").validate().is_err());
        assert!(ChatRequest::messages(vec![]).validate().is_err());
        assert!(ChatRequest::text("ok").validate().is_ok());
    }

    #[test]
    fn test_submit_ack_conv_id() {
        assert_eq!(
            SubmitAck::conv_id_from(&json!({"conv_id": "c1"})),
            Some("c1".to_string())
        );
        assert_eq!(SubmitAck::conv_id_from(&json!({"conv_id": ""})), None);
        assert_eq!(SubmitAck::conv_id_from(&json!({})), None);
        assert_eq!(SubmitAck::conv_id_from(&Value::Null), None);
    }

    #[test]
    fn test_chat_status_answer() {
        let status: ChatStatus =
            serde_json::from_value(json!({"is_final": true, "user_answer": ""})).unwrap();
        assert!(status.is_final);
        assert_eq!(status.answer(), None);

        let status: ChatStatus = serde_json::from_value(json!({"is_final": false})).unwrap();
        assert!(!status.is_final);
    }

    #[test]
    fn test_model_info_tolerates_missing_fields() {
        let model: ModelInfo = serde_json::from_value(json!({"model_name": "qwen"})).unwrap();
        assert_eq!(model.model_name, "qwen");
        assert_eq!(model.healthy, None);
    }
}
