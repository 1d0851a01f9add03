//! A single model turn as returned by a provider adapter.
//!
//! Every adapter parses its wire format into [`ModelTurn`], so the
//! conversation loop never sees provider-specific JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single block of content within a model turn.
///
/// # Examples
///
/// ```
/// use relay_domain::conversation::response::ContentBlock;
/// use serde_json::json;
///
/// let text = ContentBlock::Text("Let me count those.".to_string());
/// assert!(text.as_text().is_some());
///
/// let tool = ContentBlock::ToolUse {
///     id: "toolu_abc123".to_string(),
///     name: "get_count".to_string(),
///     input: json!({ "days": 3 }),
/// };
/// assert!(tool.as_tool_use().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentBlock {
    /// A text content block from the model.
    Text(String),

    /// A tool use request from the model.
    ToolUse {
        /// Correlation id for the matching tool result.
        id: String,
        /// Requested tool name.
        name: String,
        /// Arguments, normally a JSON object.
        input: Value,
    },
}

impl ContentBlock {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tool_use(&self) -> Option<(&str, &str, &Value)> {
        match self {
            ContentBlock::ToolUse { id, name, input } => Some((id, name, input)),
            _ => None,
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Other(String),
}

impl StopReason {
    /// Map the stop/finish reason strings the supported APIs emit.
    pub fn from_wire(reason: &str) -> Self {
        match reason {
            "end_turn" | "stop" | "STOP" => StopReason::EndTurn,
            "tool_use" | "tool_calls" | "function_call" => StopReason::ToolUse,
            "max_tokens" | "length" | "MAX_TOKENS" => StopReason::MaxTokens,
            other => StopReason::Other(other.to_string()),
        }
    }
}

/// Token accounting reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetrics {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl UsageMetrics {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub fn accumulate(&mut self, other: UsageMetrics) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// A structured provider response: text and tool-use blocks in emission order.
///
/// # Examples
///
/// ```
/// use relay_domain::conversation::response::{ContentBlock, ModelTurn};
/// use serde_json::json;
///
/// let turn = ModelTurn::from_blocks(vec![
///     ContentBlock::Text("Checking...".to_string()),
///     ContentBlock::ToolUse {
///         id: "call_1".to_string(),
///         name: "get_count".to_string(),
///         input: json!({ "days": 3 }),
///     },
/// ]);
/// assert!(turn.has_tool_uses());
/// assert_eq!(turn.tool_uses().len(), 1);
/// assert_eq!(turn.text(), "Checking...");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelTurn {
    pub content: Vec<ContentBlock>,
    pub usage: UsageMetrics,
    pub stop_reason: Option<StopReason>,
    pub model: Option<String>,
}

impl ModelTurn {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text(text.into())],
            stop_reason: Some(StopReason::EndTurn),
            ..Self::default()
        }
    }

    pub fn from_blocks(content: Vec<ContentBlock>) -> Self {
        let stop_reason = if content.iter().any(|b| b.as_tool_use().is_some()) {
            StopReason::ToolUse
        } else {
            StopReason::EndTurn
        };
        Self {
            content,
            stop_reason: Some(stop_reason),
            ..Self::default()
        }
    }

    pub fn with_usage(mut self, usage: UsageMetrics) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Concatenate all text blocks in response order.
    pub fn text(&self) -> String {
        self.content.iter().filter_map(|b| b.as_text()).collect()
    }

    /// Tool-use blocks as `(id, name, input)`, in emission order.
    pub fn tool_uses(&self) -> Vec<(&str, &str, &Value)> {
        self.content.iter().filter_map(|b| b.as_tool_use()).collect()
    }

    pub fn has_tool_uses(&self) -> bool {
        self.content
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
    }
}
