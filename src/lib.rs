#![forbid(unsafe_code)]
#![doc = r#"
oai-compat

Bidirectional translation between the OpenAI Chat Completions and Responses
API families, for gateways whose inbound and upstream channels do not speak
the same wire format.

Crate highlights
- Request translation both ways: `to_responses_request` / `to_chat_request`.
- Complete-response translation both ways: `to_responses_response` /
  `to_chat_response`, plus `extract_output_text`.
- A streaming adapter (`ChatToResponsesStreamAdapter`) that turns a live
  stream of Chat Completions chunks into the Responses event lifecycle
  (`response.created` through `response.completed`) with stable item ids and
  indices.

Modules
- `models`: Data structures for both API families.
- `conversion`: Request mapping logic.
- `response`: Complete (non-streaming) response mapping logic.
- `stream`: The per-stream chunk-to-event adapter.

The crate is a pure transformation library: it performs no I/O, reads no
environment, and holds no state across requests. HTTP framing, retries and
authentication belong to the surrounding gateway.

Note: Keep the mapping rules aligned with OpenAI docs; the Responses API
evolves over time.
"#]

pub mod conversion;
pub mod error;
mod ids;
pub mod models;
pub mod response;
pub mod stream;

// Re-export the primary operations for ergonomic library use.
pub use crate::conversion::{to_chat_request, to_responses_request};
pub use crate::error::ConvertError;
pub use crate::response::{extract_output_text, to_chat_response, to_responses_response};
pub use crate::stream::{ChatToResponsesStreamAdapter, IdGen};

// Re-export model namespaces for convenience (downstream users can do
// `use oai_compat::chat`).
pub use crate::models::{chat, responses, usage};
