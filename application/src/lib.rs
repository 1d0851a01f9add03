//! Application layer for tool-relay
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod error;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ExecutionParams, SessionConfig};
pub use error::OrchestratorError;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    model_provider::{ModelProvider, ProviderError},
    progress::{LoopProgressNotifier, NoProgress},
    tool_executor::{ToolExecutorError, ToolExecutorPort},
};
pub use use_cases::build_catalog::BuildCatalogUseCase;
pub use use_cases::conversation_loop::{ConversationLoop, LoopError};
pub use use_cases::router::{
    ConsensusReport, MultiProviderRouter, ProviderStatus, RouteMode, RouteOutcome, RouterStatus,
};
pub use use_cases::tool_context::ToolContext;
