//! Port for structured conversation logging.
//!
//! [`ConversationLogger`] records the transcript of each conversation loop
//! (provider requests and replies, tool calls and results) in a
//! machine-readable form. `tracing` stays responsible for diagnostics.

use serde_json::Value;

/// A structured conversation event.
///
/// Event types emitted by the conversation loop: `loop_started`,
/// `model_request`, `model_response`, `tool_call`, `tool_result`,
/// `loop_finished`.
pub struct ConversationEvent {
    pub event_type: &'static str,
    /// Event-specific fields; always includes `provider`.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging conversation events to a structured log.
///
/// `log` is synchronous and infallible; an implementation that cannot write
/// drops the event.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
