//! OpenDerisk Core Library
//!
//! This crate provides the client side of the OpenDerisk platform API: an
//! HTTP transport that parses the server's response envelope, the
//! asynchronous chat submit/poll protocol, a typed facade over every
//! endpoint the CLI uses, and the layered YAML configuration.
//!
//! ```no_run
//! use openderisk_core::{ChatOptions, ChatRequest, OpenDeriskClient};
//! use openderisk_core::config::ApiConfig;
//!
//! # async fn run() -> Result<(), openderisk_core::ClientError> {
//! let client = OpenDeriskClient::from_config(&ApiConfig::default())?;
//! let answer = client
//!     .chat(ChatRequest::text("Hello"), ChatOptions::default())
//!     .await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod protocol;

pub use chat::{collect_text, ChatOptions, ChatSession, ChunkStream, PollResult};
pub use client::{McpEndpoint, OpenDeriskClient};
pub use error::{ClientError, ClientResult, SESSION_NOT_FOUND_CODE};
pub use http::{ApiRequest, HttpClient, HttpMethod, Transport};
pub use protocol::{ChatRequest, Envelope, Message};

/// Returns the version of the OpenDerisk Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
