//! Tool value objects

use super::sanitizer::{TextBlock, join_blocks};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed outcome of a [`ToolInvocation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub content: Vec<TextBlock>,
    pub is_error: bool,
}

/// One tool-use request and, once executed, its result.
///
/// Created open when a provider emits a tool-use block; closed by
/// [`close`](Self::close) before it is appended to the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub tool_name: String,
    pub arguments: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<InvocationResult>,
}

impl ToolInvocation {
    pub fn open(id: impl Into<String>, tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments,
            result: None,
        }
    }

    pub fn close(mut self, content: Vec<TextBlock>, is_error: bool) -> Self {
        self.result = Some(InvocationResult { content, is_error });
        self
    }

    pub fn is_closed(&self) -> bool {
        self.result.is_some()
    }

    pub fn is_error(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.is_error)
    }

    /// Result text joined for display or logging; empty while open.
    pub fn result_text(&self) -> String {
        self.result
            .as_ref()
            .map(|r| join_blocks(&r.content))
            .unwrap_or_default()
    }
}

/// Raw output from the tool backend, before sanitizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawToolOutput {
    pub content: Value,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl RawToolOutput {
    pub fn success(content: impl Into<Value>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<Value>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}
