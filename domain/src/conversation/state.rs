//! Append-only conversation history owned by one conversation loop.

use super::message::Message;
use super::response::ContentBlock;
use crate::core::error::DomainError;
use crate::tool::value_objects::ToolInvocation;
use std::collections::HashSet;

/// Ordered message history for a single provider run.
///
/// Seeded with the user query and only ever appended to. Two invariants are
/// enforced on append:
///
/// - tool-use ids are unique within the conversation
/// - a tool result is only accepted for an earlier, still unresolved tool use
///
/// # Example
///
/// ```
/// use relay_domain::conversation::{ConversationState, ContentBlock};
/// use relay_domain::tool::{TextBlock, ToolInvocation};
/// use serde_json::json;
///
/// let mut state = ConversationState::new("how many tickets in last 3 days");
/// state.push_assistant(vec![ContentBlock::ToolUse {
///     id: "call_1".into(),
///     name: "get_count".into(),
///     input: json!({ "days": 3 }),
/// }]).unwrap();
///
/// let closed = ToolInvocation::open("call_1", "get_count", json!({ "days": 3 }))
///     .close(vec![TextBlock::new("42")], false);
/// state.push_tool_result(&closed).unwrap();
///
/// assert_eq!(state.len(), 3);
/// assert!(state.pending_tool_uses().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ConversationState {
    messages: Vec<Message>,
    tool_use_ids: HashSet<String>,
    resolved: HashSet<String>,
}

impl ConversationState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(query)],
            tool_use_ids: HashSet::new(),
            resolved: HashSet::new(),
        }
    }

    /// Append an assistant turn verbatim.
    ///
    /// Rejects the whole turn, leaving the state untouched, if any tool-use id
    /// repeats within the turn or collides with an earlier one.
    pub fn push_assistant(&mut self, content: Vec<ContentBlock>) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        for (id, _, _) in content.iter().filter_map(|b| b.as_tool_use()) {
            if self.tool_use_ids.contains(id) || !seen.insert(id) {
                return Err(DomainError::DuplicateToolUseId(id.to_string()));
            }
        }
        self.tool_use_ids
            .extend(seen.into_iter().map(str::to_string));
        self.messages.push(Message::assistant(content));
        Ok(())
    }

    /// Append the result of a closed invocation.
    pub fn push_tool_result(&mut self, invocation: &ToolInvocation) -> Result<(), DomainError> {
        let Some(result) = &invocation.result else {
            return Err(DomainError::InvocationNotClosed(invocation.id.clone()));
        };
        if !self.tool_use_ids.contains(&invocation.id) {
            return Err(DomainError::UnmatchedToolResult(invocation.id.clone()));
        }
        if !self.resolved.insert(invocation.id.clone()) {
            return Err(DomainError::ToolResultAlreadyAppended(invocation.id.clone()));
        }

        self.messages.push(Message::ToolResult {
            tool_use_id: invocation.id.clone(),
            tool_name: invocation.tool_name.clone(),
            content: result.content.clone(),
            is_error: result.is_error,
        });
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false: a conversation starts with the user query.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The seeding user query.
    pub fn query(&self) -> &str {
        match self.messages.first() {
            Some(Message::User { text }) => text,
            _ => "",
        }
    }

    /// Tool-use ids that have no result yet, in emission order.
    pub fn pending_tool_uses(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Assistant { content } => Some(content),
                _ => None,
            })
            .flatten()
            .filter_map(|b| b.as_tool_use())
            .map(|(id, _, _)| id)
            .filter(|id| !self.resolved.contains(*id))
            .collect()
    }

    /// Whether `id` has already been used by a tool-use block.
    pub fn has_tool_use_id(&self, id: &str) -> bool {
        self.tool_use_ids.contains(id)
    }
}
