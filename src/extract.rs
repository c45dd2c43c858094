use serde_json::Value;

/// Answer text used when nothing could be extracted from a response.
///
/// Results carrying this marker never pass, regardless of score.
pub const EXTRACTION_FAILURE_MARKER: &str =
    "Error: No answer could be extracted from the response.";

/// One step of a parsed response path
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Object field access
    Key(String),
    /// Sequence index access; also matches an object key spelled as the
    /// same digits
    Index(usize),
}

/// A dot-separated field-access expression, parsed once up front
#[derive(Debug, Clone)]
pub struct ResponsePath {
    segments: Vec<Segment>,
    raw: String,
}

impl ResponsePath {
    /// Parse a dot-path such as `choices.0.message.content`.
    ///
    /// Returns `None` for an empty or whitespace-only path, which means
    /// auto-detection should be used instead.
    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return None;
        }

        let segments = trimmed
            .split('.')
            .map(|part| match part.parse::<usize>() {
                Ok(index) => Segment::Index(index),
                Err(_) => Segment::Key(part.to_string()),
            })
            .collect();

        Some(Self {
            segments,
            raw: trimmed.to_string(),
        })
    }

    /// The path as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Walk the path through a response value, yielding the text at the end.
    pub fn resolve(&self, value: &Value) -> Option<String> {
        let mut current = value;
        for segment in &self.segments {
            current = match segment {
                Segment::Key(key) => current.get(key)?,
                Segment::Index(index) => match current {
                    Value::Array(items) => items.get(*index)?,
                    Value::Object(map) => map.get(&index.to_string())?,
                    _ => return None,
                },
            };
        }
        value_text(current)
    }
}

/// Outcome of answer extraction
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Extracted answer text, or the failure marker
    pub text: String,
    /// Warnings collected along the way
    pub notes: Vec<String>,
    /// True when no answer text could be produced at all
    pub failed: bool,
}

/// Pull the answer text out of a raw response.
///
/// A non-empty `response_path` is tried first; on a miss the auto-detection
/// probes run in fixed priority order. Never fails: worst case the result
/// carries the failure marker and a note.
pub fn extract(raw: &Value, response_path: &str) -> Extraction {
    let mut notes = Vec::new();
    let mut text = String::new();

    if let Some(path) = ResponsePath::parse(response_path) {
        match path.resolve(raw) {
            Some(found) => text = found,
            None => notes.push(format!(
                "Warning: could not extract answer using path \"{}\"; attempting auto-detection.",
                path.as_str()
            )),
        }
    }

    if text.is_empty() {
        if let Value::String(s) = raw {
            // A bare string response is the answer as-is, even when empty.
            text = s.clone();
        } else {
            for probe in STRUCTURED_PROBES {
                if let Some(found) = probe(raw) {
                    text = found;
                    break;
                }
            }
            if text.is_empty() {
                text = raw.to_string();
                notes.push(
                    "Warning: could not determine the answer field in the response; using the full response."
                        .to_string(),
                );
            }
        }
    }

    if text.is_empty() {
        notes.push("Failed to extract an answer from the response.".to_string());
        return Extraction {
            text: EXTRACTION_FAILURE_MARKER.to_string(),
            notes,
            failed: true,
        };
    }

    Extraction {
        text,
        notes,
        failed: false,
    }
}

/// Auto-detection probes for structured responses, in priority order.
///
/// Each probe is pure and independent so shapes can be tested in isolation.
const STRUCTURED_PROBES: &[fn(&Value) -> Option<String>] = &[
    probe_common_fields,
    probe_chat_choices,
    probe_generations,
    probe_data_content,
    probe_completion,
    probe_nested_chat_choices,
];

/// Top-level answer fields used by most plain RAG endpoints
fn probe_common_fields(raw: &Value) -> Option<String> {
    for field in ["answer", "response", "result", "content", "text", "message"] {
        if let Some(text) = raw.get(field).and_then(string_text) {
            return Some(text);
        }
    }
    None
}

/// OpenAI chat completion shape: `choices[0]`
fn probe_chat_choices(raw: &Value) -> Option<String> {
    let choice = raw.get("choices")?.as_array()?.first()?;
    if let Some(text) = choice.pointer("/message/content").and_then(string_text) {
        return Some(text);
    }
    if let Some(text) = choice.get("text").and_then(string_text) {
        return Some(text);
    }
    Some(choice.to_string())
}

/// `generations[0]` shape used by some LLM APIs
fn probe_generations(raw: &Value) -> Option<String> {
    let generation = raw.get("generations")?.as_array()?.first()?;
    match generation.get("text").and_then(string_text) {
        Some(text) => Some(text),
        None => Some(generation.to_string()),
    }
}

/// Nested `data.content` field
fn probe_data_content(raw: &Value) -> Option<String> {
    raw.pointer("/data/content").and_then(string_text)
}

/// Anthropic-style `completion` / `completions`
fn probe_completion(raw: &Value) -> Option<String> {
    raw.get("completion")
        .and_then(string_text)
        .or_else(|| raw.get("completions").and_then(string_text))
}

/// Chat completion shape nested under `data`, seen behind proxy APIs
fn probe_nested_chat_choices(raw: &Value) -> Option<String> {
    raw.pointer("/data/choices/0/message/content")
        .and_then(string_text)
}

/// Non-empty string content of a value
fn string_text(value: &Value) -> Option<String> {
    match value.as_str() {
        Some(s) if !s.is_empty() => Some(s.to_string()),
        _ => None,
    }
}

/// Terminal path values: strings pass through, other scalars stringify, and
/// containers serialize to JSON
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(_) | Value::Array(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_resolves_chat_completion_shape() {
        let raw = json!({"choices": [{"message": {"content": "Paris"}}]});
        let path = ResponsePath::parse("choices.0.message.content").unwrap();
        assert_eq!(path.resolve(&raw), Some("Paris".to_string()));

        let extraction = extract(&raw, "choices.0.message.content");
        assert_eq!(extraction.text, "Paris");
        assert!(extraction.notes.is_empty());
        assert!(!extraction.failed);
    }

    #[test]
    fn test_path_miss_records_note_and_falls_back() {
        let raw = json!({"choices": []});
        let extraction = extract(&raw, "choices.0.message.content");
        // The path misses, no structured probe matches, and the whole
        // response is used as a last resort.
        assert_eq!(extraction.text, raw.to_string());
        assert_eq!(extraction.notes.len(), 2);
        assert!(extraction.notes[0].contains("choices.0.message.content"));
        assert!(!extraction.failed);
    }

    #[test]
    fn test_empty_path_means_auto_detect() {
        assert!(ResponsePath::parse("").is_none());
        assert!(ResponsePath::parse("   ").is_none());

        let raw = json!({"answer": "42"});
        let extraction = extract(&raw, "");
        assert_eq!(extraction.text, "42");
    }

    #[test]
    fn test_numeric_segment_indexes_arrays_and_digit_keys() {
        let path = ResponsePath::parse("items.1").unwrap();
        assert_eq!(
            path.resolve(&json!({"items": ["a", "b"]})),
            Some("b".to_string())
        );
        assert_eq!(
            path.resolve(&json!({"items": {"1": "keyed"}})),
            Some("keyed".to_string())
        );
        assert_eq!(path.resolve(&json!({"items": "scalar"})), None);
    }

    #[test]
    fn test_path_to_container_serializes_it() {
        let raw = json!({"data": {"inner": [1, 2]}});
        let path = ResponsePath::parse("data").unwrap();
        assert_eq!(path.resolve(&raw), Some(r#"{"inner":[1,2]}"#.to_string()));
    }

    #[test]
    fn test_raw_string_response_used_directly() {
        let raw = Value::String("The capital of France is Paris.".to_string());
        let extraction = extract(&raw, "");
        assert_eq!(extraction.text, "The capital of France is Paris.");
        assert!(!extraction.failed);
    }

    #[test]
    fn test_empty_string_response_is_a_failure() {
        let extraction = extract(&Value::String(String::new()), "");
        assert_eq!(extraction.text, EXTRACTION_FAILURE_MARKER);
        assert!(extraction.failed);
        assert!(!extraction.notes.is_empty());
    }

    #[test]
    fn test_common_field_priority_order() {
        // `answer` wins over `response` even when both are present
        let raw = json!({"response": "second", "answer": "first"});
        assert_eq!(probe_common_fields(&raw), Some("first".to_string()));

        let raw = json!({"message": "only"});
        assert_eq!(probe_common_fields(&raw), Some("only".to_string()));

        assert_eq!(probe_common_fields(&json!({"other": "x"})), None);
    }

    #[test]
    fn test_chat_choices_probe_shapes() {
        let message = json!({"choices": [{"message": {"content": "from message"}}]});
        assert_eq!(probe_chat_choices(&message), Some("from message".to_string()));

        let text = json!({"choices": [{"text": "from text"}]});
        assert_eq!(probe_chat_choices(&text), Some("from text".to_string()));

        // Unknown choice shape serializes the choice itself
        let odd = json!({"choices": [{"delta": "x"}]});
        assert_eq!(probe_chat_choices(&odd), Some(r#"{"delta":"x"}"#.to_string()));

        assert_eq!(probe_chat_choices(&json!({"choices": []})), None);
    }

    #[test]
    fn test_generations_probe() {
        let raw = json!({"generations": [{"text": "gen"}]});
        assert_eq!(probe_generations(&raw), Some("gen".to_string()));

        let odd = json!({"generations": [{"output": "x"}]});
        assert_eq!(probe_generations(&odd), Some(r#"{"output":"x"}"#.to_string()));
    }

    #[test]
    fn test_remaining_probes() {
        assert_eq!(
            probe_data_content(&json!({"data": {"content": "nested"}})),
            Some("nested".to_string())
        );
        assert_eq!(
            probe_completion(&json!({"completion": "anthro"})),
            Some("anthro".to_string())
        );
        assert_eq!(
            probe_completion(&json!({"completions": "plural"})),
            Some("plural".to_string())
        );
        assert_eq!(
            probe_nested_chat_choices(
                &json!({"data": {"choices": [{"message": {"content": "proxied"}}]}})
            ),
            Some("proxied".to_string())
        );
    }

    #[test]
    fn test_unrecognized_object_uses_full_response_with_note() {
        let raw = json!({"telemetry": {"latency_ms": 12}});
        let extraction = extract(&raw, "");
        assert_eq!(extraction.text, raw.to_string());
        assert_eq!(extraction.notes.len(), 1);
        assert!(!extraction.failed);
    }

    #[test]
    fn test_null_response_serializes_to_null_literal() {
        let extraction = extract(&Value::Null, "");
        assert_eq!(extraction.text, "null");
        assert!(!extraction.failed);
    }
}
