//! Data models for the Chat Completions and Responses APIs.
//!
//! This module groups three submodules:
//! - `chat`: Chat Completions requests, responses and streaming chunks.
//! - `responses`: Responses API requests, input items, responses and output items.
//! - `usage`: the token-accounting struct shared by both families.
//!
//! The mapping logic between the two families lives in `crate::conversion`
//! (requests), `crate::response` (complete responses) and `crate::stream`
//! (live SSE streams).

pub mod chat;
pub mod responses;
pub mod usage;

// Convenience re-exports for downstream users.
pub use chat::{
    ChatCompletionsRequest, ChatCompletionsResponse, ChatContent, ChatMessage, ChatStreamChunk,
    ToolCall, ToolDefinition,
};
pub use responses::{
    InputItem, OutputContent, OutputItem, ResponseStatus, ResponsesRequest, ResponsesResponse,
    ResponsesTool,
};
pub use usage::Usage;
