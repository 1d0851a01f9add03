//! Result Sanitizer: bounded, provider-safe text from raw tool output.
//!
//! Backends return anything from a bare string to an MCP content array to an
//! arbitrary JSON object. [`sanitize`] flattens all of them into
//! [`TextBlock`]s and enforces a byte budget, cutting at a line boundary and
//! appending [`TRUNCATION_MARKER`] when the budget is exceeded.

use crate::util::truncate_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Suffix appended to any truncated payload.
pub const TRUNCATION_MARKER: &str = "\n\n[response truncated]";

const NO_DATA: &str = "No data available";
const EMPTY_RESULT: &str = "(empty result)";

/// A single text content block as sent back to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "text")]
pub struct TextBlock {
    pub text: String,
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Join blocks into the single string a provider wire format carries.
pub fn join_blocks(blocks: &[TextBlock]) -> String {
    blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Which kind of consumer the output is bound for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientProfile {
    /// Desktop or other constrained clients with a tight payload cap
    Constrained,
    /// Server-side callers
    #[default]
    Server,
}

/// Per-profile output caps, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeLimits {
    pub constrained: usize,
    pub server: usize,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            constrained: 50_000,
            server: 500_000,
        }
    }
}

impl SizeLimits {
    pub fn for_profile(&self, profile: ClientProfile) -> usize {
        match profile {
            ClientProfile::Constrained => self.constrained,
            ClientProfile::Server => self.server,
        }
    }
}

/// Normalize `raw` into at least one text block no longer than `size_limit`
/// bytes plus [`TRUNCATION_MARKER`].
///
/// # Example
///
/// ```
/// use relay_domain::tool::sanitizer::{sanitize, TRUNCATION_MARKER};
/// use serde_json::json;
///
/// let blocks = sanitize(&json!({ "count": 42 }), 1_000);
/// assert_eq!(blocks.len(), 1);
/// assert!(blocks[0].text.contains("\"count\": 42"));
///
/// let long = "line\n".repeat(100);
/// let blocks = sanitize(&json!(long), 12);
/// assert_eq!(blocks[0].text, format!("line\nline{TRUNCATION_MARKER}"));
/// ```
pub fn sanitize(raw: &Value, size_limit: usize) -> Vec<TextBlock> {
    let blocks: Vec<TextBlock> = normalize(raw)
        .into_iter()
        .map(|text| {
            if text.is_empty() {
                TextBlock::new(EMPTY_RESULT)
            } else {
                TextBlock::new(text)
            }
        })
        .collect();

    let total: usize = blocks.iter().map(|b| b.text.len()).sum::<usize>()
        + blocks.len().saturating_sub(1);
    if total <= size_limit {
        return blocks;
    }

    vec![TextBlock::new(truncate_at_line(
        &join_blocks(&blocks),
        size_limit,
    ))]
}

/// Blocks describing a tool failure.
pub fn sanitize_error(message: &str, size_limit: usize) -> Vec<TextBlock> {
    sanitize(
        &Value::String(format!("Tool execution error: {}", message)),
        size_limit,
    )
}

fn normalize(raw: &Value) -> Vec<String> {
    match raw {
        Value::Null => vec![NO_DATA.to_string()],
        Value::String(s) => vec![s.clone()],
        Value::Array(items) if items.is_empty() => vec![NO_DATA.to_string()],
        Value::Array(items) => items.iter().map(content_item_text).collect(),
        Value::Object(_) => vec![pretty(raw)],
        Value::Bool(_) | Value::Number(_) => vec![raw.to_string()],
    }
}

/// Text of one entry in an MCP-style content array.
fn content_item_text(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Object(map) => match (map.get("type"), map.get("text")) {
            (Some(Value::String(kind)), Some(Value::String(text))) if kind == "text" => {
                text.clone()
            }
            _ => item.to_string(),
        },
        other => other.to_string(),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("Error formatting content: {}", e))
}

/// Cut `text` to at most `limit` bytes at the last line break and append the
/// truncation marker. Falls back to a char-boundary cut when the kept prefix
/// contains no line break.
fn truncate_at_line(text: &str, limit: usize) -> String {
    let prefix = truncate_str(text, limit);
    let cut = match prefix.rfind('\n') {
        Some(pos) if pos > 0 => &prefix[..pos],
        _ => prefix,
    };
    format!("{}{}", cut, TRUNCATION_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn serialized_len(blocks: &[TextBlock]) -> usize {
        join_blocks(blocks).len()
    }

    #[test]
    fn test_null_yields_no_data() {
        assert_eq!(sanitize(&Value::Null, 100), vec![TextBlock::new(NO_DATA)]);
    }

    #[test]
    fn test_string_passes_through() {
        assert_eq!(sanitize(&json!("42"), 100), vec![TextBlock::new("42")]);
    }

    #[test]
    fn test_empty_string_is_not_empty_block() {
        assert_eq!(sanitize(&json!(""), 100), vec![TextBlock::new(EMPTY_RESULT)]);
    }

    #[test]
    fn test_mcp_content_array() {
        let raw = json!([
            { "type": "text", "text": "first" },
            { "type": "image", "data": "..." },
            "plain"
        ]);
        let blocks = sanitize(&raw, 1_000);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].text, "first");
        assert!(blocks[1].text.contains("\"image\""));
        assert_eq!(blocks[2].text, "plain");
    }

    #[test]
    fn test_object_is_pretty_json() {
        let blocks = sanitize(&json!({ "tickets": [1, 2] }), 1_000);
        assert!(blocks[0].text.starts_with("{\n"));
    }

    #[test]
    fn test_scalars() {
        assert_eq!(sanitize(&json!(3.5), 10)[0].text, "3.5");
        assert_eq!(sanitize(&json!(true), 10)[0].text, "true");
    }

    #[test]
    fn test_truncates_at_line_boundary() {
        let raw = json!("alpha\nbravo\ncharlie\ndelta");
        let blocks = sanitize(&raw, 15);
        assert_eq!(blocks[0].text, format!("alpha\nbravo{}", TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncates_without_newline_at_char_boundary() {
        let raw = json!("あのねあのね");
        let blocks = sanitize(&raw, 7);
        assert_eq!(blocks[0].text, format!("あの{}", TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncated_json_keeps_marker_outside_payload() {
        let rows: Vec<Value> = (0..200)
            .map(|i| json!({ "id": i, "subject": "Printer on fire" }))
            .collect();
        let blocks = sanitize(&json!({ "rows": rows }), 500);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].text.ends_with(TRUNCATION_MARKER));
        let body = blocks[0].text.trim_end_matches(TRUNCATION_MARKER);
        assert!(!body.contains("[response truncated]"));
    }

    #[test]
    fn test_output_never_empty_and_bounded() {
        let inputs = [
            Value::Null,
            json!(""),
            json!([]),
            json!("x".repeat(1_000)),
            json!("line\n".repeat(500)),
            json!([{ "type": "text", "text": "a\n".repeat(300) }, { "type": "text", "text": "b" }]),
            json!({ "nested": { "deep": ["v", "v", "v"] } }),
            json!(-1),
        ];
        for limit in [0usize, 1, 5, 16, 64, 1_000, 100_000] {
            for raw in &inputs {
                let blocks = sanitize(raw, limit);
                assert!(!blocks.is_empty());
                assert!(blocks.iter().all(|b| !b.text.is_empty()));
                assert!(
                    serialized_len(&blocks) <= limit + TRUNCATION_MARKER.len(),
                    "limit {limit} raw {raw}"
                );
            }
        }
    }

    #[test]
    fn test_does_not_mutate_raw() {
        let raw = json!({ "a": "b".repeat(100) });
        let before = raw.clone();
        let _ = sanitize(&raw, 10);
        assert_eq!(raw, before);
    }

    #[test]
    fn test_sanitize_error_prefix() {
        let blocks = sanitize_error("connection refused", 1_000);
        assert_eq!(blocks[0].text, "Tool execution error: connection refused");
    }

    #[test]
    fn test_size_limits_for_profile() {
        let limits = SizeLimits::default();
        assert_eq!(limits.for_profile(ClientProfile::Constrained), 50_000);
        assert_eq!(limits.for_profile(ClientProfile::Server), 500_000);
        assert_eq!(ClientProfile::default(), ClientProfile::Server);
    }

    #[test]
    fn test_text_block_serialization() {
        let json = serde_json::to_value(TextBlock::new("hi")).unwrap();
        assert_eq!(json, json!({ "type": "text", "text": "hi" }));
    }
}
