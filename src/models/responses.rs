use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;

use crate::models::usage::Usage;

/// Reasoning configuration forwarded between the request families.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// "low" | "medium" | "high" | "none"
    #[serde(default)]
    pub effort: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Responses tool declaration. Function tools are flattened (name and schema
/// at the top level); built-in tool kinds pass through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesTool {
    Function {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameters: Option<Value>,
    },
    #[serde(untagged)]
    Other(Value),
}

/// Responses `tool_choice`: a mode string, or an object with the function
/// name flattened next to `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsesToolChoice {
    Mode(String),
    Function {
        #[serde(rename = "type")]
        kind: String,
        name: String,
    },
    Other(Value),
}

/// Responses API request (the subset the gateway translates).
///
/// `input` stays a raw JSON value: the wire allows a plain string or an array
/// of input items, and the translator dispatches on its shape so malformed
/// payloads surface the canonical "input must be a string or array" error.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsesRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub tools: Option<Vec<ResponsesTool>>,
    #[serde(default)]
    pub tool_choice: Option<ResponsesToolChoice>,
    #[serde(default)]
    pub parallel_tool_calls: Option<bool>,
    #[serde(default)]
    pub reasoning: Option<ReasoningConfig>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub store: Option<bool>,
    #[serde(default)]
    pub user: Option<String>,
}

// ---------------------------------------------------------------------------
// Input items
// ---------------------------------------------------------------------------

/// One element of a Responses `input` array, tagged by `type`.
///
/// Items without a `type` (plain messages) and unknown kinds both land in
/// `Untyped`; the translator decides which of the two it is looking at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    Message(InputMessage),
    FunctionCall(FunctionCallItem),
    FunctionCallOutput(FunctionCallOutputItem),
    #[serde(untagged)]
    Untyped(Value),
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputMessage {
    /// Defaults to "user" when absent.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<InputContent>,
}

/// A function invocation recorded in the conversation history.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub call_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// The tool's result for an earlier `function_call`, keyed by `call_id`.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallOutputItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub call_id: String,
    #[serde(default)]
    pub output: String,
}

/// Input-message content: a plain string or an array of typed parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputContent {
    Text(String),
    Parts(Vec<InputPart>),
}

/// One typed part of an input message. Unknown kinds are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputPart {
    InputText {
        text: String,
    },
    InputImage {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_url: Option<ImageSource>,
    },
    InputAudio {
        input_audio: Value,
    },
    InputFile {
        file: Value,
    },
    OutputText {
        text: String,
    },
    #[serde(untagged)]
    Other(Value),
}

/// `image_url` arrives either as a bare URL string or as `{ "url": … }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSource {
    Url(String),
    Object { url: String },
}

impl ImageSource {
    pub fn url(&self) -> &str {
        match self {
            ImageSource::Url(url) => url,
            ImageSource::Object { url } => url,
        }
    }
}

// ---------------------------------------------------------------------------
// Responses and output items
// ---------------------------------------------------------------------------

/// Terminal and non-terminal response states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    InProgress,
    Completed,
    Incomplete,
    Failed,
}

impl ResponseStatus {
    /// Map a Chat finish reason onto a terminal status.
    pub fn from_finish_reason(reason: &str) -> ResponseStatus {
        match reason {
            "length" => ResponseStatus::Incomplete,
            "content_filter" => ResponseStatus::Failed,
            _ => ResponseStatus::Completed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::InProgress => "in_progress",
            ResponseStatus::Completed => "completed",
            ResponseStatus::Incomplete => "incomplete",
            ResponseStatus::Failed => "failed",
        }
    }
}

impl Default for ResponseStatus {
    fn default() -> Self {
        ResponseStatus::Completed
    }
}

/// One typed part of an output message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputContent {
    OutputText {
        text: String,
        #[serde(default)]
        annotations: Vec<Value>,
    },
    Reasoning {
        text: String,
    },
    #[serde(untagged)]
    Other(Value),
}

/// A top-level element of a Responses `output` array. Vendor item kinds the
/// translator does not model (`image_generation_call`, …) pass through
/// verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message {
        id: String,
        #[serde(default)]
        status: ResponseStatus,
        role: String,
        #[serde(default)]
        content: Vec<OutputContent>,
    },
    FunctionCall {
        id: String,
        #[serde(default)]
        status: ResponseStatus,
        #[serde(default)]
        call_id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        arguments: String,
    },
    #[serde(untagged)]
    Other(Value),
}

/// Complete (non-streaming) Responses API response.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsesResponse {
    pub id: String,
    #[serde(default = "response_object")]
    pub object: String,
    #[serde(default)]
    pub created_at: i64,
    pub status: ResponseStatus,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub output: Vec<OutputItem>,
    #[serde(default)]
    pub usage: Option<Usage>,
    // Echoed back from the originating request.
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<ReasoningConfig>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

fn response_object() -> String {
    "response".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn input_item_dispatches_on_type() {
        let item: InputItem = serde_json::from_value(json!({
            "type": "function_call", "call_id": "c1", "name": "f", "arguments": "{}"
        }))
        .unwrap();
        match item {
            InputItem::FunctionCall(fc) => {
                assert_eq!(fc.call_id, "c1");
                assert_eq!(fc.name, "f");
            }
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[test]
    fn typeless_and_unknown_items_fall_back_to_untyped() {
        let plain: InputItem =
            serde_json::from_value(json!({"role": "user", "content": "hi"})).unwrap();
        assert!(matches!(plain, InputItem::Untyped(_)));

        let vendor: InputItem =
            serde_json::from_value(json!({"type": "web_search_call", "id": "ws_1"})).unwrap();
        assert!(matches!(vendor, InputItem::Untyped(_)));
    }

    #[test]
    fn image_source_accepts_both_encodings() {
        let bare: ImageSource = serde_json::from_value(json!("https://a/b.png")).unwrap();
        assert_eq!(bare.url(), "https://a/b.png");

        let object: ImageSource =
            serde_json::from_value(json!({"url": "https://a/c.png"})).unwrap();
        assert_eq!(object.url(), "https://a/c.png");
    }

    #[test]
    fn output_text_always_serializes_annotations() {
        let part = OutputContent::OutputText {
            text: "hi".into(),
            annotations: vec![],
        };
        assert_eq!(
            serde_json::to_value(&part).unwrap(),
            json!({"type": "output_text", "text": "hi", "annotations": []})
        );
    }

    #[test]
    fn vendor_output_items_pass_through() {
        let raw = json!({"type": "image_generation_call", "id": "ig_1", "status": "completed", "result": null});
        let item: OutputItem = serde_json::from_value(raw.clone()).unwrap();
        assert!(matches!(item, OutputItem::Other(_)));
        assert_eq!(serde_json::to_value(&item).unwrap(), raw);
    }

    #[test]
    fn status_maps_finish_reasons() {
        assert_eq!(
            ResponseStatus::from_finish_reason("stop"),
            ResponseStatus::Completed
        );
        assert_eq!(
            ResponseStatus::from_finish_reason("tool_calls"),
            ResponseStatus::Completed
        );
        assert_eq!(
            ResponseStatus::from_finish_reason("length"),
            ResponseStatus::Incomplete
        );
        assert_eq!(
            ResponseStatus::from_finish_reason("content_filter"),
            ResponseStatus::Failed
        );
    }
}
