//! Complete (non-streaming) response translation between the two families.

use crate::ids;
use crate::models::chat;
use crate::models::responses as resp;
use crate::models::usage::Usage;

/// Convert a complete Chat Completions response into a Responses API
/// response.
///
/// The original Responses request, when available, supplies the echo-back
/// fields (`instructions`, `max_output_tokens`, sampling knobs, `reasoning`,
/// `metadata`) that the Chat wire format has no place for.
///
/// Output construction:
/// - a `message` item is emitted when the assistant produced text, reasoning,
///   or nothing at all (so text-only and empty responses still have output);
///   reasoning precedes text inside its content
/// - each tool call becomes a `function_call` item after the message
pub fn to_responses_response(
    chat_resp: &chat::ChatCompletionsResponse,
    original: Option<&resp::ResponsesRequest>,
) -> resp::ResponsesResponse {
    let id = if chat_resp.id.starts_with("resp_") {
        chat_resp.id.clone()
    } else {
        ids::mint("resp")
    };

    let created_at = chat_resp
        .created
        .as_ref()
        .and_then(number_to_epoch)
        .unwrap_or_else(ids::unix_timestamp);

    let mut output: Vec<resp::OutputItem> = Vec::new();
    let mut status = resp::ResponseStatus::Completed;

    if let Some(choice) = chat_resp.choices.first() {
        let message = &choice.message;
        let tool_calls = message.tool_calls.as_deref().unwrap_or(&[]);
        let text = message.content.clone().unwrap_or_default();
        let reasoning = message.reasoning_content.clone().unwrap_or_default();

        if !text.is_empty() || !reasoning.is_empty() || tool_calls.is_empty() {
            let mut content = Vec::new();
            if !reasoning.is_empty() {
                content.push(resp::OutputContent::Reasoning { text: reasoning });
            }
            if !text.is_empty() {
                content.push(resp::OutputContent::OutputText {
                    text,
                    annotations: vec![],
                });
            }
            output.push(resp::OutputItem::Message {
                id: ids::mint("msg"),
                status: resp::ResponseStatus::Completed,
                role: "assistant".to_string(),
                content,
            });
        }

        for tc in tool_calls {
            output.push(resp::OutputItem::FunctionCall {
                id: ids::mint("fc"),
                status: resp::ResponseStatus::Completed,
                call_id: tc.id.clone(),
                name: tc.function.name.clone(),
                arguments: tc.function.arguments.clone(),
            });
        }

        if let Some(reason) = choice.finish_reason.as_deref() {
            status = resp::ResponseStatus::from_finish_reason(reason);
        }
    }

    resp::ResponsesResponse {
        id,
        object: "response".to_string(),
        created_at,
        status,
        model: chat_resp.model.clone(),
        output,
        usage: chat_resp.usage.as_ref().map(Usage::normalized),
        instructions: original.and_then(|r| r.instructions.clone()),
        max_output_tokens: original.and_then(|r| r.max_output_tokens),
        temperature: original.and_then(|r| r.temperature),
        top_p: original.and_then(|r| r.top_p),
        reasoning: original.and_then(|r| r.reasoning.clone()),
        metadata: original.and_then(|r| r.metadata.clone()),
    }
}

/// Convert a complete Responses API response into a Chat Completions
/// response, returning the normalised usage alongside it for the caller's
/// accounting.
///
/// The first `message` output item supplies the assistant text (its
/// `output_text` parts concatenated) and reasoning; every `function_call`
/// item becomes a `tool_calls` entry. `id` overrides the response's own id
/// when non-empty, so the gateway can keep the identifier it handed out.
pub fn to_chat_response(
    src: &resp::ResponsesResponse,
    id: &str,
) -> (chat::ChatCompletionsResponse, Usage) {
    let mut text = String::new();
    let mut reasoning = String::new();
    let mut tool_calls: Vec<chat::ToolCall> = Vec::new();
    let mut message_seen = false;

    for item in &src.output {
        match item {
            resp::OutputItem::Message { content, .. } => {
                if message_seen {
                    continue;
                }
                message_seen = true;
                for part in content {
                    match part {
                        resp::OutputContent::OutputText { text: t, .. } => text.push_str(t),
                        resp::OutputContent::Reasoning { text: t } => reasoning.push_str(t),
                        resp::OutputContent::Other(_) => {}
                    }
                }
            }
            resp::OutputItem::FunctionCall {
                call_id,
                name,
                arguments,
                ..
            } => {
                tool_calls.push(chat::ToolCall {
                    id: call_id.clone(),
                    kind: "function".to_string(),
                    function: chat::FunctionCall {
                        name: name.clone(),
                        arguments: arguments.clone(),
                    },
                });
            }
            resp::OutputItem::Other(_) => {}
        }
    }

    let finish_reason = match src.status {
        resp::ResponseStatus::Incomplete => "length",
        resp::ResponseStatus::Failed => "content_filter",
        _ if !tool_calls.is_empty() => "tool_calls",
        _ => "stop",
    };

    let usage = src.usage.clone().unwrap_or_default().normalized();

    let message = chat::AssistantMessage {
        role: "assistant".to_string(),
        content: message_seen.then_some(text),
        reasoning_content: (!reasoning.is_empty()).then_some(reasoning),
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
    };

    let chat_resp = chat::ChatCompletionsResponse {
        id: if id.is_empty() {
            src.id.clone()
        } else {
            id.to_string()
        },
        object: "chat.completion".to_string(),
        created: Some(serde_json::Number::from(src.created_at)),
        model: src.model.clone(),
        choices: vec![chat::ChatChoice {
            index: 0,
            message,
            finish_reason: Some(finish_reason.to_string()),
        }],
        usage: Some(usage.clone()),
    };

    (chat_resp, usage)
}

/// Concatenate every `output_text` part of every message output item.
pub fn extract_output_text(src: &resp::ResponsesResponse) -> String {
    let mut out = String::new();
    for item in &src.output {
        if let resp::OutputItem::Message { content, .. } = item {
            for part in content {
                if let resp::OutputContent::OutputText { text, .. } = part {
                    out.push_str(text);
                }
            }
        }
    }
    out
}

fn number_to_epoch(created: &serde_json::Number) -> Option<i64> {
    created
        .as_i64()
        .or_else(|| created.as_f64().map(|secs| secs as i64))
}
