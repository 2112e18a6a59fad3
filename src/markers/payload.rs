//! Raw oracle output → structured payload.

use serde_json::Value;

/// What an oracle answer turned out to contain.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The literal sentinel the prompt asked for when nothing applies.
    Sentinel,
    /// A JSON object.
    Json(Value),
    /// Anything else: prose, truncated JSON, arrays, empty output.
    Unparseable,
}

/// Strip an optional fenced code block (```` ```json … ``` ````) around model output.
///
/// Returns the trimmed inner text. Text without a fence is returned trimmed.
pub fn strip_code_fences(raw: &str) -> &str {
    let text = raw.trim();
    let Some(open) = text.find("```") else {
        return text;
    };
    let mut inner = &text[open + 3..];

    // Skip a language tag such as `json` on the opening line.
    if let Some(nl) = inner.find('\n') {
        let tag = inner[..nl].trim();
        if tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            inner = &inner[nl + 1..];
        }
    }

    if let Some(close) = inner.rfind("```") {
        inner = &inner[..close];
    }
    inner.trim()
}

/// Classify raw oracle output against `sentinel` (case-insensitive) and JSON.
pub fn extract_payload(raw: &str, sentinel: &str) -> Payload {
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Payload::Unparseable;
    }
    if body.eq_ignore_ascii_case(sentinel) {
        return Payload::Sentinel;
    }

    if let Some(value) = parse_object(body) {
        return Payload::Json(value);
    }

    // Models occasionally wrap the object in a sentence.
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => parse_object(&body[start..=end])
            .map(Payload::Json)
            .unwrap_or(Payload::Unparseable),
        _ => Payload::Unparseable,
    }
}

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}
