//! Conversation domain module
//!
//! The per-provider conversation: its append-only [`ConversationState`], the
//! normalized [`ModelTurn`] every adapter produces, and the [`LoopMachine`]
//! that keeps the conversation loop inside its legal phases.

pub mod message;
pub mod phase;
pub mod response;
pub mod state;

pub use message::{Message, Role};
pub use phase::{LoopMachine, LoopPhase};
pub use response::{ContentBlock, ModelTurn, StopReason, UsageMetrics};
pub use state::ConversationState;
