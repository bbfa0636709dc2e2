//! Chat completion over the asynchronous submit/poll protocol

pub mod aggregate;
pub mod session;

pub use aggregate::collect_text;
pub use session::{ChatOptions, ChatSession, ChunkStream, PollResult};
