use thiserror::Error;

/// Errors surfaced by the request translators.
///
/// Only malformed inputs are fatal; unknown tool kinds, content parts and
/// input items are normalised or dropped silently (see `conversion`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("model is required")]
    ModelRequired,
    /// The Responses `input` field was neither a JSON string nor an array.
    #[error("input must be a string or array")]
    UnsupportedInput,
}
