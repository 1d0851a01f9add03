//! Domain layer for tool-relay
//!
//! This crate contains the core types and pure algorithms of the
//! tool-augmented conversation orchestrator. It has no dependencies on
//! infrastructure or presentation concerns and performs no I/O.
//!
//! # Core Concepts
//!
//! ## Tools
//!
//! A [`ToolCatalog`] of provider-neutral [`ToolDescriptor`]s is discovered
//! once per session. Each provider sees it through its own [`Dialect`]; tool
//! output re-enters the conversation through [`sanitize`].
//!
//! ## Conversations
//!
//! Every provider run owns a [`ConversationState`] and advances through
//! [`LoopPhase`]s until it produces a [`ProviderResult`].
//!
//! ## Consensus
//!
//! Results from several providers can be compared with [`analyze`], a
//! lexical-overlap heuristic.

pub mod config;
pub mod consensus;
pub mod conversation;
pub mod core;
pub mod prompt;
pub mod provider;
pub mod tool;
pub mod util;

// Re-export commonly used types
pub use config::OutputFormat;
pub use consensus::{Confidence, ConsensusSummary, analyze};
pub use conversation::{
    ContentBlock, ConversationState, LoopMachine, LoopPhase, Message, ModelTurn, Role, StopReason,
    UsageMetrics,
};
pub use core::error::DomainError;
pub use prompt::{PromptTemplate, ReportKind};
pub use provider::{FailureKind, ProviderFailure, ProviderId, ProviderResult, Termination};
pub use tool::{
    ClientProfile, DefaultToolValidator, Dialect, InvocationResult, RawToolOutput, SizeLimits,
    TRUNCATION_MARKER, TextBlock, ToolCatalog, ToolDescriptor, ToolInvocation, ToolValidator,
    sanitize, translate,
};
