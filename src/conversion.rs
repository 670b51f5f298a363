use serde_json::{json, Value};

use crate::error::ConvertError;
use crate::models::chat;
use crate::models::responses as resp;

/// Convert a Chat Completions request into a Responses API request.
///
/// Mapping highlights:
/// - a leading system message becomes `instructions`
/// - remaining messages become `input` items: plain messages map 1:1,
///   assistant `tool_calls` fan out into `function_call` items, and tool
///   results become `function_call_output` items keyed by `tool_call_id`
/// - `max_tokens` -> `max_output_tokens`; `reasoning_effort` -> `reasoning.effort`
///   (omitted when "none" or absent)
/// - function tools are flattened to the Responses shape; other tool kinds
///   are forwarded as `{ "type": … }` only
pub fn to_responses_request(
    src: &chat::ChatCompletionsRequest,
) -> Result<resp::ResponsesRequest, ConvertError> {
    if src.model.is_empty() {
        return Err(ConvertError::ModelRequired);
    }

    let mut instructions: Option<String> = None;
    let mut items: Vec<resp::InputItem> = Vec::new();

    for (position, message) in src.messages.iter().enumerate() {
        if position == 0 && message.role == "system" {
            let text = message_text(message);
            if !text.is_empty() {
                instructions = Some(text);
            }
            continue;
        }

        match message.role.as_str() {
            "tool" => {
                let call_id = message.tool_call_id.clone().unwrap_or_default();
                if call_id.is_empty() {
                    continue;
                }
                items.push(resp::InputItem::FunctionCallOutput(
                    resp::FunctionCallOutputItem {
                        id: None,
                        call_id,
                        output: message_text(message),
                    },
                ));
            }
            "assistant" => {
                // Text first, then one function_call item per tool call.
                let text = message_text(message);
                if !text.is_empty() {
                    items.push(message_input_item(message));
                }
                for tc in message.tool_calls.as_deref().unwrap_or(&[]) {
                    items.push(resp::InputItem::FunctionCall(resp::FunctionCallItem {
                        id: None,
                        call_id: tc.id.clone(),
                        name: tc.function.name.clone(),
                        arguments: tc.function.arguments.clone(),
                    }));
                }
            }
            _ => items.push(message_input_item(message)),
        }
    }

    let tools = src
        .tools
        .as_ref()
        .map(|ts| ts.iter().map(tool_to_responses).collect::<Vec<_>>());

    Ok(resp::ResponsesRequest {
        model: src.model.clone(),
        input: if items.is_empty() {
            None
        } else {
            serde_json::to_value(items).ok()
        },
        instructions,
        stream: src.stream,
        max_output_tokens: src.max_tokens,
        temperature: src.temperature,
        top_p: src.top_p,
        tools,
        tool_choice: src.tool_choice.as_ref().map(tool_choice_to_responses),
        parallel_tool_calls: src.parallel_tool_calls,
        reasoning: src
            .reasoning_effort
            .as_deref()
            .filter(|effort| !effort.is_empty() && *effort != "none")
            .map(|effort| resp::ReasoningConfig {
                effort: Some(effort.to_string()),
                summary: None,
            }),
        metadata: src.metadata.clone(),
        store: src.store,
        user: src.user.clone(),
    })
}

/// Convert a Responses API request into a Chat Completions request, for
/// upstream channels that only speak the Chat wire format.
///
/// Mapping highlights:
/// - `instructions` -> a leading system message (skipped when blank)
/// - `input` string -> a single user message; `input` array items are walked
///   in order, with `function_call` items folded into the trailing assistant
///   message's `tool_calls` and `function_call_output` items becoming
///   tool-role messages
/// - `max_output_tokens` -> `max_tokens`; `reasoning.effort` -> `reasoning_effort`
/// - tools and tool_choice reverse the flattening of [`to_responses_request`]
pub fn to_chat_request(
    src: &resp::ResponsesRequest,
) -> Result<chat::ChatCompletionsRequest, ConvertError> {
    if src.model.is_empty() {
        return Err(ConvertError::ModelRequired);
    }

    let mut messages: Vec<chat::ChatMessage> = Vec::new();

    if let Some(instructions) = src.instructions.as_deref() {
        if !instructions.trim().is_empty() {
            messages.push(chat::ChatMessage {
                role: "system".to_string(),
                content: Some(chat::ChatContent::Text(instructions.to_string())),
                ..Default::default()
            });
        }
    }

    if let Some(input) = src.input.as_ref() {
        parse_input(input, &mut messages)?;
    }

    let tools = src.tools.as_ref().map(|ts| {
        ts.iter()
            .filter_map(tool_to_chat)
            .collect::<Vec<chat::ToolDefinition>>()
    });

    Ok(chat::ChatCompletionsRequest {
        model: src.model.clone(),
        messages,
        stream: src.stream,
        max_tokens: src.max_output_tokens,
        temperature: src.temperature,
        top_p: src.top_p,
        tools: tools.filter(|ts| !ts.is_empty()),
        tool_choice: src.tool_choice.as_ref().map(tool_choice_to_chat),
        parallel_tool_calls: src.parallel_tool_calls,
        user: src.user.clone(),
        store: src.store,
        metadata: src.metadata.clone(),
        reasoning_effort: src
            .reasoning
            .as_ref()
            .and_then(|r| r.effort.as_deref())
            .filter(|effort| !effort.is_empty() && *effort != "none")
            .map(str::to_string),
    })
}

/// Walk a Responses `input` value and append the equivalent chat messages.
fn parse_input(
    input: &Value,
    messages: &mut Vec<chat::ChatMessage>,
) -> Result<(), ConvertError> {
    match input {
        Value::String(text) => {
            messages.push(chat::ChatMessage {
                role: "user".to_string(),
                content: Some(chat::ChatContent::Text(text.clone())),
                ..Default::default()
            });
            Ok(())
        }
        Value::Array(raw_items) => {
            for raw in raw_items {
                let Ok(item) = serde_json::from_value::<resp::InputItem>(raw.clone()) else {
                    tracing::debug!("skipping unparseable input item");
                    continue;
                };
                match item {
                    resp::InputItem::Message(message) => {
                        messages.push(input_message_to_chat(message));
                    }
                    resp::InputItem::FunctionCall(fc) => {
                        if fc.call_id.is_empty() || fc.name.is_empty() {
                            continue;
                        }
                        let tool_call = chat::ToolCall {
                            id: fc.call_id,
                            kind: "function".to_string(),
                            function: chat::FunctionCall {
                                name: fc.name,
                                arguments: fc.arguments,
                            },
                        };
                        // Fold into the trailing assistant message when there
                        // is one, preserving insertion order.
                        match messages.last_mut() {
                            Some(last) if last.role == "assistant" => {
                                last.tool_calls.get_or_insert_with(Vec::new).push(tool_call);
                            }
                            _ => messages.push(chat::ChatMessage {
                                role: "assistant".to_string(),
                                tool_calls: Some(vec![tool_call]),
                                ..Default::default()
                            }),
                        }
                    }
                    resp::InputItem::FunctionCallOutput(output) => {
                        if output.call_id.is_empty() {
                            continue;
                        }
                        messages.push(chat::ChatMessage {
                            role: "tool".to_string(),
                            content: Some(chat::ChatContent::Text(output.output)),
                            tool_call_id: Some(output.call_id),
                            ..Default::default()
                        });
                    }
                    resp::InputItem::Untyped(value) => {
                        // Items without a `type` are plain messages; anything
                        // else is a vendor kind we cannot express in Chat.
                        if value.get("type").is_none() {
                            if let Ok(message) =
                                serde_json::from_value::<resp::InputMessage>(value)
                            {
                                messages.push(input_message_to_chat(message));
                            }
                        } else {
                            tracing::debug!(
                                kind = value.get("type").and_then(serde_json::Value::as_str),
                                "dropping input item with no chat equivalent"
                            );
                        }
                    }
                }
            }
            Ok(())
        }
        _ => Err(ConvertError::UnsupportedInput),
    }
}

fn input_message_to_chat(message: resp::InputMessage) -> chat::ChatMessage {
    let role = message
        .role
        .filter(|role| !role.is_empty())
        .unwrap_or_else(|| "user".to_string());
    chat::ChatMessage {
        role,
        content: message.content.map(input_content_to_chat),
        ..Default::default()
    }
}

fn input_content_to_chat(content: resp::InputContent) -> chat::ChatContent {
    match content {
        resp::InputContent::Text(text) => chat::ChatContent::Text(text),
        resp::InputContent::Parts(parts) => {
            let mut chat_parts = Vec::new();
            for part in parts {
                match part {
                    resp::InputPart::InputText { text } | resp::InputPart::OutputText { text } => {
                        chat_parts.push(chat::ChatContentPart::Text { text });
                    }
                    resp::InputPart::InputImage { image_url } => {
                        let url = image_url.map(|s| s.url().to_string()).unwrap_or_default();
                        if !url.is_empty() {
                            chat_parts.push(chat::ChatContentPart::ImageUrl {
                                image_url: chat::ImageUrl { url, detail: None },
                            });
                        }
                    }
                    resp::InputPart::InputAudio { input_audio } => {
                        chat_parts.push(chat::ChatContentPart::InputAudio { input_audio });
                    }
                    resp::InputPart::InputFile { file } => {
                        chat_parts.push(chat::ChatContentPart::File { file });
                    }
                    resp::InputPart::Other(value) => {
                        chat_parts.push(chat::ChatContentPart::Other(value));
                    }
                }
            }
            // A lone text part collapses to plain string content, the shape
            // Chat-only upstreams overwhelmingly expect.
            match chat_parts.as_slice() {
                [] => chat::ChatContent::Text(String::new()),
                [chat::ChatContentPart::Text { text }] => chat::ChatContent::Text(text.clone()),
                _ => chat::ChatContent::Parts(chat_parts),
            }
        }
    }
}

fn message_input_item(message: &chat::ChatMessage) -> resp::InputItem {
    resp::InputItem::Message(resp::InputMessage {
        role: Some(message.role.clone()),
        content: message
            .content
            .as_ref()
            .map(|content| chat_content_to_input(content, &message.role)),
    })
}

fn chat_content_to_input(content: &chat::ChatContent, role: &str) -> resp::InputContent {
    match content {
        chat::ChatContent::Text(text) => resp::InputContent::Text(text.clone()),
        chat::ChatContent::Parts(parts) => resp::InputContent::Parts(
            parts
                .iter()
                .map(|part| chat_part_to_input(part, role))
                .collect(),
        ),
    }
}

fn chat_part_to_input(part: &chat::ChatContentPart, role: &str) -> resp::InputPart {
    match part {
        // Assistant history is output on the Responses side.
        chat::ChatContentPart::Text { text } if role == "assistant" => {
            resp::InputPart::OutputText { text: text.clone() }
        }
        chat::ChatContentPart::Text { text } => resp::InputPart::InputText { text: text.clone() },
        chat::ChatContentPart::ImageUrl { image_url } => resp::InputPart::InputImage {
            image_url: Some(resp::ImageSource::Object {
                url: image_url.url.clone(),
            }),
        },
        chat::ChatContentPart::InputAudio { input_audio } => resp::InputPart::InputAudio {
            input_audio: input_audio.clone(),
        },
        chat::ChatContentPart::File { file } => resp::InputPart::InputFile { file: file.clone() },
        chat::ChatContentPart::Other(value) => resp::InputPart::Other(value.clone()),
    }
}

fn message_text(message: &chat::ChatMessage) -> String {
    message
        .content
        .as_ref()
        .map(chat::ChatContent::as_text)
        .unwrap_or_default()
}

fn tool_to_responses(tool: &chat::ToolDefinition) -> resp::ResponsesTool {
    match (&tool.kind, &tool.function) {
        (kind, Some(function)) if kind == "function" => resp::ResponsesTool::Function {
            name: function.name.clone(),
            description: function.description.clone(),
            parameters: function.parameters.clone(),
        },
        _ => resp::ResponsesTool::Other(json!({ "type": tool.kind })),
    }
}

fn tool_to_chat(tool: &resp::ResponsesTool) -> Option<chat::ToolDefinition> {
    match tool {
        resp::ResponsesTool::Function {
            name,
            description,
            parameters,
        } => Some(chat::ToolDefinition {
            kind: "function".to_string(),
            function: Some(chat::FunctionDefinition {
                name: name.clone(),
                description: description.clone(),
                parameters: parameters.clone(),
            }),
        }),
        // Built-in tool kinds (web_search, code_interpreter, …) keep only
        // their type; the channel adaptor downstream knows what to do.
        resp::ResponsesTool::Other(value) => {
            let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
            if kind.is_empty() {
                None
            } else {
                Some(chat::ToolDefinition {
                    kind: kind.to_string(),
                    function: None,
                })
            }
        }
    }
}

fn tool_choice_to_responses(tc: &chat::ChatToolChoice) -> resp::ResponsesToolChoice {
    match tc {
        chat::ChatToolChoice::Mode(mode) => resp::ResponsesToolChoice::Mode(mode.clone()),
        chat::ChatToolChoice::Function { kind, function } if kind == "function" => {
            resp::ResponsesToolChoice::Function {
                kind: kind.clone(),
                name: function.name.clone(),
            }
        }
        other => resp::ResponsesToolChoice::Other(
            serde_json::to_value(other).unwrap_or(Value::Null),
        ),
    }
}

fn tool_choice_to_chat(tc: &resp::ResponsesToolChoice) -> chat::ChatToolChoice {
    match tc {
        resp::ResponsesToolChoice::Mode(mode) => chat::ChatToolChoice::Mode(mode.clone()),
        resp::ResponsesToolChoice::Function { kind, name } if kind == "function" && !name.is_empty() => {
            chat::ChatToolChoice::Function {
                kind: kind.clone(),
                function: chat::FunctionName { name: name.clone() },
            }
        }
        other => {
            chat::ChatToolChoice::Other(serde_json::to_value(other).unwrap_or(Value::Null))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_basic_fields() {
        let req = chat::ChatCompletionsRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![
                chat::ChatMessage {
                    role: "system".into(),
                    content: Some(chat::ChatContent::Text("You are helpful.".into())),
                    ..Default::default()
                },
                chat::ChatMessage {
                    role: "user".into(),
                    content: Some(chat::ChatContent::Text("Hello".into())),
                    ..Default::default()
                },
            ],
            max_tokens: Some(128),
            temperature: Some(0.3),
            top_p: Some(0.95),
            stream: Some(false),
            user: Some("unit".into()),
            ..Default::default()
        };

        let out = to_responses_request(&req).unwrap();
        assert_eq!(out.model, "gpt-4o-mini");
        assert_eq!(out.instructions.as_deref(), Some("You are helpful."));
        assert_eq!(out.max_output_tokens, Some(128));
        assert_eq!(out.temperature, Some(0.3));
        assert_eq!(out.top_p, Some(0.95));
        assert_eq!(out.stream, Some(false));
        assert_eq!(out.user.as_deref(), Some("unit"));

        let input = out.input.unwrap();
        assert_eq!(
            input,
            json!([{"type": "message", "role": "user", "content": "Hello"}])
        );
    }

    #[test]
    fn missing_model_is_an_error() {
        let req = chat::ChatCompletionsRequest::default();
        assert_eq!(
            to_responses_request(&req).unwrap_err(),
            ConvertError::ModelRequired
        );

        let req = resp::ResponsesRequest::default();
        assert_eq!(to_chat_request(&req).unwrap_err(), ConvertError::ModelRequired);
    }

    #[test]
    fn reasoning_effort_none_is_omitted() {
        let mut req = chat::ChatCompletionsRequest {
            model: "m".into(),
            reasoning_effort: Some("none".into()),
            ..Default::default()
        };
        assert!(to_responses_request(&req).unwrap().reasoning.is_none());

        req.reasoning_effort = Some("high".into());
        let reasoning = to_responses_request(&req).unwrap().reasoning.unwrap();
        assert_eq!(reasoning.effort.as_deref(), Some("high"));
    }

    #[test]
    fn function_call_folds_into_trailing_assistant_message() {
        let req = resp::ResponsesRequest {
            model: "m".into(),
            input: Some(json!([
                {"type": "message", "role": "assistant", "content": "Let me check."},
                {"type": "function_call", "call_id": "c1", "name": "a", "arguments": "{}"},
                {"type": "function_call", "call_id": "c2", "name": "b", "arguments": "{}"}
            ])),
            ..Default::default()
        };

        let out = to_chat_request(&req).unwrap();
        assert_eq!(out.messages.len(), 1);
        let calls = out.messages[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "c1");
        assert_eq!(calls[1].id, "c2");
    }

    #[test]
    fn input_of_invalid_shape_is_rejected() {
        let req = resp::ResponsesRequest {
            model: "m".into(),
            input: Some(json!(42)),
            ..Default::default()
        };
        assert_eq!(
            to_chat_request(&req).unwrap_err(),
            ConvertError::UnsupportedInput
        );
    }

    #[test]
    fn non_function_tools_keep_only_their_type() {
        let req = resp::ResponsesRequest {
            model: "m".into(),
            tools: Some(vec![
                resp::ResponsesTool::Function {
                    name: "lookup".into(),
                    description: None,
                    parameters: Some(json!({"type": "object"})),
                },
                resp::ResponsesTool::Other(json!({"type": "web_search", "filters": {}})),
            ]),
            ..Default::default()
        };

        let out = to_chat_request(&req).unwrap();
        let tools = out.tools.unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].kind, "function");
        assert_eq!(tools[0].function.as_ref().unwrap().name, "lookup");
        assert_eq!(tools[1].kind, "web_search");
        assert!(tools[1].function.is_none());
    }
}
