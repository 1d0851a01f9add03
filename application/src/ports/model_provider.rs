//! Model Provider port
//!
//! One adapter per provider API. Adapters own the wire format in both
//! directions: they render a [`ConversationState`] plus translated tool
//! declarations into a request, and parse the reply into a [`ModelTurn`].

use async_trait::async_trait;
use relay_domain::{ConversationState, Dialect, ModelTurn, ProviderId};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while talking to a model provider
///
/// Every variant is fatal for the conversation loop that hit it.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

impl ProviderError {
    /// True when the reply could not be interpreted, as opposed to the
    /// provider not being reachable at all.
    pub fn is_invalid_response(&self) -> bool {
        matches!(self, ProviderError::InvalidResponse(_))
    }
}

/// A model provider capable of native tool use
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Tool-schema dialect expected in `send_turn`'s `tools`
    fn dialect(&self) -> Dialect {
        self.id().dialect()
    }

    /// Model identifier requests are sent to
    fn model(&self) -> &str;

    /// Send the full conversation and tool declarations; return one turn.
    async fn send_turn(
        &self,
        conversation: &ConversationState,
        tools: &[Value],
    ) -> Result<ModelTurn, ProviderError>;
}
