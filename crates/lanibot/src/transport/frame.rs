use serde_json::Value;

/// Marker that starts every frame line
pub const FRAME_PREFIX: &str = "data: ";

/// Payload that ends the stream normally
pub const DONE_SENTINEL: &str = "[DONE]";

/// What a single line of the event stream turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Not a frame: blank separator, comment or keep-alive
    Ignored,
    /// The termination sentinel
    Done,
    /// An error frame. Terminal.
    Error(String),
    /// A non-empty content delta
    Delta(String),
    /// Valid JSON carrying neither an error nor content, e.g. a role announcement
    Empty,
    /// The payload was not valid JSON
    Malformed(String),
}

/// Classify one complete line of the event stream
pub fn parse_line(line: &str) -> FrameOutcome {
    let Some(payload) = line.strip_prefix(FRAME_PREFIX) else {
        return FrameOutcome::Ignored;
    };

    if payload.trim() == DONE_SENTINEL {
        return FrameOutcome::Done;
    }

    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => return FrameOutcome::Malformed(e.to_string()),
    };

    if let Some(message) = error_message(&value) {
        return FrameOutcome::Error(message);
    }

    match value
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
    {
        Some(content) if !content.is_empty() => FrameOutcome::Delta(content.to_string()),
        _ => FrameOutcome::Empty,
    }
}

/// The frame's `error` field, if it holds anything meaningful.
/// Empty strings, `false`, `0` and `null` do not count as errors.
fn error_message(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) if message.is_empty() => None,
        Value::String(message) => Some(message.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
