//! Streaming adapter: Chat Completions chunks in, Responses SSE events out.

use serde_json::{json, Value};

use crate::ids;
use crate::models::chat;
use crate::models::responses as resp;
use crate::models::usage::Usage;

/// Source of the collision-resistant tokens behind minted identifiers.
/// Injectable so tests can pin the `resp_` / `msg_` / `fc_` ids.
pub type IdGen = Box<dyn FnMut() -> String + Send>;

/// Accumulated state for one upstream tool call, keyed by the chunk's
/// `tool_calls[].index`.
#[derive(Debug, Default)]
struct ToolCallState {
    item_id: String,
    call_id: String,
    name: String,
    arguments: String,
}

/// Converts a live stream of Chat Completions chunks into the Responses API
/// event lifecycle (`response.created` … `response.completed`).
///
/// One adapter serves exactly one stream: it owns the minted response and
/// item identifiers and the per-stream indexing state, and must be fed chunks
/// by a single consumer in arrival order. Feeding a chunk never blocks; each
/// call returns the full batch of events that chunk produced, already
/// JSON-encoded and ready for SSE framing (without the `data: ` prefix).
pub struct ChatToResponsesStreamAdapter {
    response_id: String,
    created_at: i64,
    model: String,
    id_gen: IdGen,

    initialized: bool,
    message_item_id: String,
    content_part_index: u32,
    has_text_content: bool,
    text_content_index: u32,
    has_reasoning_content: bool,
    reasoning_content_index: u32,
    /// Open tool calls as (upstream index, state) pairs, in arrival order.
    /// Close-out events must follow the order calls were opened, so this is
    /// a list rather than a map sorted by index.
    tool_calls: Vec<(u32, ToolCallState)>,
    output_index: u32,
}

impl ChatToResponsesStreamAdapter {
    /// Create an adapter for one stream. The original Responses request, when
    /// available, seeds the advertised model until the first chunk names one.
    pub fn new(original: Option<&resp::ResponsesRequest>) -> Self {
        Self::with_id_gen(original, Box::new(ids::uuid_token))
    }

    /// Same as [`ChatToResponsesStreamAdapter::new`] with an injected
    /// identifier source, for deterministic tests.
    pub fn with_id_gen(original: Option<&resp::ResponsesRequest>, mut id_gen: IdGen) -> Self {
        let response_id = format!("resp_{}", id_gen());
        let message_item_id = format!("msg_{}", id_gen());
        tracing::debug!(response_id = %response_id, "starting chat-to-responses stream");
        ChatToResponsesStreamAdapter {
            response_id,
            created_at: ids::unix_timestamp(),
            model: original.map(|r| r.model.clone()).unwrap_or_default(),
            id_gen,
            initialized: false,
            message_item_id,
            content_part_index: 0,
            has_text_content: false,
            text_content_index: 0,
            has_reasoning_content: false,
            reasoning_content_index: 0,
            tool_calls: Vec::new(),
            output_index: 0,
        }
    }

    /// The `resp_…` identifier minted for this stream.
    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    /// Convert one upstream chunk into zero or more Responses event payloads.
    ///
    /// Events come out in their normative order: stream initialisation first
    /// (`response.created`, `response.in_progress`), then per-modality
    /// `*.added`/`*.delta` events, and on a finish reason the full close-out
    /// sequence ending in `response.completed`. After `response.completed`
    /// the adapter must not be fed again.
    pub fn convert_chunk(&mut self, chunk: &chat::ChatStreamChunk) -> Vec<Vec<u8>> {
        let mut events: Vec<Vec<u8>> = Vec::new();

        if !chunk.model.is_empty() {
            self.model = chunk.model.clone();
        }

        if !self.initialized {
            self.initialized = true;
            push_event(&mut events, self.response_created_event());
            push_event(&mut events, self.response_in_progress_event());
        }

        let Some(choice) = chunk.choices.first() else {
            return events;
        };
        let delta = &choice.delta;

        // A role announcement opens the message item, unless content already
        // implied it.
        if delta.role.as_deref() == Some("assistant")
            && !self.has_text_content
            && !self.has_reasoning_content
        {
            push_event(&mut events, self.message_item_added_event());
        }

        // Reasoning first: it precedes text in output order.
        if let Some(reasoning) = delta.reasoning_content.as_deref().filter(|s| !s.is_empty()) {
            if !self.has_reasoning_content {
                self.has_reasoning_content = true;
                self.reasoning_content_index = self.content_part_index;
                self.content_part_index += 1;
                push_event(
                    &mut events,
                    self.content_part_added_event("reasoning", self.reasoning_content_index),
                );
            }
            push_event(&mut events, self.reasoning_delta_event(reasoning));
        }

        if let Some(text) = delta.content.as_deref().filter(|s| !s.is_empty()) {
            if !self.has_text_content {
                self.has_text_content = true;
                self.text_content_index = self.content_part_index;
                self.content_part_index += 1;
                push_event(
                    &mut events,
                    self.content_part_added_event("output_text", self.text_content_index),
                );
            }
            push_event(&mut events, self.text_delta_event(text));
        }

        for tc in delta.tool_calls.as_deref().unwrap_or(&[]) {
            let idx = tc.index.unwrap_or(0);

            if !self.tool_calls.iter().any(|(i, _)| *i == idx) {
                let state = ToolCallState {
                    item_id: format!("fc_{}", (self.id_gen)()),
                    call_id: tc.id.clone().unwrap_or_default(),
                    name: tc.function.name.clone().unwrap_or_default(),
                    arguments: String::new(),
                };
                self.output_index += 1;
                push_event(&mut events, self.function_call_added_event(&state));
                self.tool_calls.push((idx, state));
            }

            if let Some(args) = tc.function.arguments.as_deref().filter(|s| !s.is_empty()) {
                if let Some((_, state)) = self.tool_calls.iter_mut().find(|(i, _)| *i == idx) {
                    state.arguments.push_str(args);
                }
                push_event(
                    &mut events,
                    self.function_call_arguments_delta_event(idx, args),
                );
            }
        }

        if let Some(reason) = choice.finish_reason.as_deref().filter(|s| !s.is_empty()) {
            if self.has_reasoning_content {
                push_event(&mut events, self.reasoning_done_event());
                push_event(
                    &mut events,
                    self.content_part_done_event("reasoning", self.reasoning_content_index),
                );
            }
            if self.has_text_content {
                push_event(&mut events, self.text_done_event());
                push_event(
                    &mut events,
                    self.content_part_done_event("output_text", self.text_content_index),
                );
            }
            if self.has_text_content || self.has_reasoning_content {
                push_event(&mut events, self.message_item_done_event());
            }
            for (idx, state) in &self.tool_calls {
                push_event(
                    &mut events,
                    self.function_call_arguments_done_event(*idx, state),
                );
                push_event(&mut events, self.function_call_item_done_event(*idx, state));
            }
            push_event(
                &mut events,
                self.response_completed_event(chunk.usage.as_ref(), reason),
            );
            tracing::debug!(
                response_id = %self.response_id,
                finish_reason = reason,
                "stream closed"
            );
        }

        events
    }

    /// Output index of a tool call's events: slot 0 belongs to the message
    /// item whenever one exists, shifting tool calls up by one.
    fn tool_output_index(&self, idx: u32) -> u32 {
        if self.has_text_content || self.has_reasoning_content {
            idx + 1
        } else {
            idx
        }
    }

    fn response_created_event(&self) -> Value {
        json!({
            "type": "response.created",
            "response": {
                "id": self.response_id,
                "object": "response",
                "created_at": self.created_at,
                "status": "in_progress",
                "model": self.model,
                "output": [],
            },
        })
    }

    fn response_in_progress_event(&self) -> Value {
        json!({
            "type": "response.in_progress",
            "response": {
                "id": self.response_id,
                "object": "response",
                "created_at": self.created_at,
                "status": "in_progress",
                "model": self.model,
            },
        })
    }

    fn message_item_added_event(&self) -> Value {
        json!({
            "type": "response.output_item.added",
            "output_index": 0,
            "item": {
                "type": "message",
                "id": self.message_item_id,
                "status": "in_progress",
                "role": "assistant",
                "content": [],
            },
        })
    }

    fn content_part_added_event(&self, part_type: &str, content_index: u32) -> Value {
        json!({
            "type": "response.content_part.added",
            "item_id": self.message_item_id,
            "output_index": 0,
            "content_index": content_index,
            "part": { "type": part_type, "text": "" },
        })
    }

    fn content_part_done_event(&self, part_type: &str, content_index: u32) -> Value {
        json!({
            "type": "response.content_part.done",
            "item_id": self.message_item_id,
            "output_index": 0,
            "content_index": content_index,
            "part": { "type": part_type, "text": "" },
        })
    }

    fn text_delta_event(&self, delta: &str) -> Value {
        json!({
            "type": "response.output_text.delta",
            "item_id": self.message_item_id,
            "output_index": 0,
            "content_index": self.text_content_index,
            "delta": delta,
        })
    }

    // Deltas are not accumulated for text, so `text` stays empty here; the
    // downstream client has already seen every fragment.
    fn text_done_event(&self) -> Value {
        json!({
            "type": "response.output_text.done",
            "item_id": self.message_item_id,
            "output_index": 0,
            "content_index": self.text_content_index,
            "text": "",
        })
    }

    fn reasoning_delta_event(&self, delta: &str) -> Value {
        json!({
            "type": "response.reasoning.delta",
            "item_id": self.message_item_id,
            "output_index": 0,
            "content_index": self.reasoning_content_index,
            "delta": delta,
        })
    }

    fn reasoning_done_event(&self) -> Value {
        json!({
            "type": "response.reasoning.done",
            "item_id": self.message_item_id,
            "output_index": 0,
            "content_index": self.reasoning_content_index,
            "text": "",
        })
    }

    fn message_item_done_event(&self) -> Value {
        json!({
            "type": "response.output_item.done",
            "output_index": 0,
            "item": {
                "type": "message",
                "id": self.message_item_id,
                "status": "completed",
                "role": "assistant",
                "content": self.message_content_snapshot(false),
            },
        })
    }

    fn function_call_added_event(&self, state: &ToolCallState) -> Value {
        json!({
            "type": "response.output_item.added",
            "output_index": self.output_index,
            "item": {
                "type": "function_call",
                "id": state.item_id,
                "status": "in_progress",
                "call_id": state.call_id,
                "name": state.name,
                "arguments": "",
            },
        })
    }

    fn function_call_arguments_delta_event(&self, idx: u32, delta: &str) -> Value {
        let item_id = self
            .tool_calls
            .iter()
            .find(|(i, _)| *i == idx)
            .map(|(_, state)| state.item_id.as_str())
            .unwrap_or_default();
        json!({
            "type": "response.function_call_arguments.delta",
            "item_id": item_id,
            "output_index": self.tool_output_index(idx),
            "delta": delta,
        })
    }

    fn function_call_arguments_done_event(&self, idx: u32, state: &ToolCallState) -> Value {
        json!({
            "type": "response.function_call_arguments.done",
            "item_id": state.item_id,
            "output_index": self.tool_output_index(idx),
            "arguments": state.arguments,
        })
    }

    fn function_call_item_done_event(&self, idx: u32, state: &ToolCallState) -> Value {
        json!({
            "type": "response.output_item.done",
            "output_index": self.tool_output_index(idx),
            "item": {
                "type": "function_call",
                "id": state.item_id,
                "status": "completed",
                "call_id": state.call_id,
                "name": state.name,
                "arguments": state.arguments,
            },
        })
    }

    fn response_completed_event(&self, usage: Option<&Usage>, finish_reason: &str) -> Value {
        let status = resp::ResponseStatus::from_finish_reason(finish_reason);

        let mut output: Vec<Value> = Vec::new();
        if self.has_text_content || self.has_reasoning_content {
            output.push(json!({
                "type": "message",
                "id": self.message_item_id,
                "status": "completed",
                "role": "assistant",
                "content": self.message_content_snapshot(true),
            }));
        }
        for (_, state) in &self.tool_calls {
            output.push(json!({
                "type": "function_call",
                "id": state.item_id,
                "status": "completed",
                "call_id": state.call_id,
                "name": state.name,
                "arguments": state.arguments,
            }));
        }

        let usage = usage.map(|u| {
            let u = u.normalized();
            json!({
                "input_tokens": u.input_tokens,
                "output_tokens": u.output_tokens,
                "total_tokens": u.total_tokens,
            })
        });

        json!({
            "type": "response.completed",
            "response": {
                "id": self.response_id,
                "object": "response",
                "created_at": self.created_at,
                "status": status.as_str(),
                "model": self.model,
                "output": output,
                "usage": usage,
            },
        })
    }

    /// Rebuild the message content parts in their stored index order.
    fn message_content_snapshot(&self, with_annotations: bool) -> Vec<Value> {
        let reasoning_part = json!({ "type": "reasoning", "text": "" });
        let text_part = if with_annotations {
            json!({ "type": "output_text", "text": "", "annotations": [] })
        } else {
            json!({ "type": "output_text", "text": "" })
        };

        match (self.has_reasoning_content, self.has_text_content) {
            (true, true) => {
                if self.reasoning_content_index <= self.text_content_index {
                    vec![reasoning_part, text_part]
                } else {
                    vec![text_part, reasoning_part]
                }
            }
            (true, false) => vec![reasoning_part],
            (false, true) => vec![text_part],
            (false, false) => vec![],
        }
    }
}

/// Payload shapes are fully controlled, so a failed marshal is bug-grade;
/// the event is dropped and the stream carries on.
fn push_event(events: &mut Vec<Vec<u8>>, event: Value) {
    match serde_json::to_vec(&event) {
        Ok(bytes) => events.push(bytes),
        Err(error) => tracing::warn!(%error, "dropping unencodable stream event"),
    }
}
