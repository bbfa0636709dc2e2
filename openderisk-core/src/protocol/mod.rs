//! Wire types for the OpenDerisk API
//!
//! This module defines the request bodies, response envelopes and resource
//! models exchanged with the platform. Field names match the server exactly.

pub mod app;
pub mod envelope;
pub mod mcp;
pub mod types;

pub use app::{AgentApp, AgentAppPage};
pub use envelope::Envelope;
pub use mcp::{McpCreateRequest, McpKind, McpServer, McpTool};
pub use types::{
    ChatInput, ChatRequest, ChatStatus, ConversationInfo, Message, MessageRole, ModelInfo,
    SubmitAck, ASYNC_WORK_MODE, DEFAULT_USER_NAME,
};
