use thiserror::Error;

/// The event input is not a sequence of record-like items.
///
/// This is the only failure the aggregator surfaces; individual malformed rows
/// are skipped instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputShapeError {
    #[error("expected a sequence of listening events, found {found}")]
    NotASequence { found: &'static str },
    #[error("item {index} is not a listening event record, found {found}")]
    NotARecord { index: usize, found: &'static str },
}

/// Name of a JSON value's kind, for error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
