//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// These are invariant violations of the pure domain model. They never carry
/// I/O failures; those live in the application and infrastructure layers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Duplicate tool name in catalog: {0}")]
    DuplicateTool(String),

    #[error("Tool use id '{0}' already present in conversation")]
    DuplicateToolUseId(String),

    #[error("Tool result '{0}' has no matching tool use")]
    UnmatchedToolResult(String),

    #[error("Tool result '{0}' was already appended")]
    ToolResultAlreadyAppended(String),

    #[error("Tool invocation '{0}' is still open")]
    InvocationNotClosed(String),

    #[error("Illegal loop transition: {from} -> {to}")]
    IllegalTransition { from: String, to: String },
}

impl DomainError {
    /// Check if this error is a conversation ordering violation
    pub fn is_conversation_violation(&self) -> bool {
        matches!(
            self,
            DomainError::DuplicateToolUseId(_)
                | DomainError::UnmatchedToolResult(_)
                | DomainError::ToolResultAlreadyAppended(_)
                | DomainError::InvocationNotClosed(_)
        )
    }
}
