use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;

fn is_zero(n: &u64) -> bool {
    *n == 0
}

/// Token accounting shared by both API families.
///
/// The Chat family counts `prompt_tokens`/`completion_tokens`, the Responses
/// family `input_tokens`/`output_tokens`. Upstreams may set either set (or
/// both); [`Usage::normalized`] resolves the overlap with the Responses-family
/// counters taking precedence when explicitly provided.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    /// Zero means "not provided"; omitted on the wire in that case.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub input_tokens: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub output_tokens: u64,
    #[serde(default)]
    pub prompt_tokens_details: Option<Value>,
    #[serde(default)]
    pub completion_tokens_details: Option<Value>,
}

impl Usage {
    /// Fill whichever counter family is missing from the other one.
    ///
    /// Explicitly set `input_tokens`/`output_tokens` win over the Chat-family
    /// counters; an absent family is copied from its counterpart so both
    /// views of the usage stay consistent.
    pub fn normalized(&self) -> Usage {
        let mut usage = self.clone();
        if usage.input_tokens == 0 {
            usage.input_tokens = usage.prompt_tokens;
        }
        if usage.prompt_tokens == 0 {
            usage.prompt_tokens = usage.input_tokens;
        }
        if usage.output_tokens == 0 {
            usage.output_tokens = usage.completion_tokens;
        }
        if usage.completion_tokens == 0 {
            usage.completion_tokens = usage.output_tokens;
        }
        if usage.total_tokens == 0 {
            usage.total_tokens = usage.input_tokens + usage.output_tokens;
        }
        usage
    }
}
