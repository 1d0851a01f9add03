//! Conversation loop phases.
//!
//! ```text
//! AwaitingModel ─▶ ModelResponded ─┬─▶ Done
//!       ▲                          └─▶ ToolRequested ─▶ ToolExecuting ⇄ ToolResolved
//!       └──────────────────────────────────────────────────────────────────┘
//! any non-terminal phase except ToolExecuting ─▶ Aborted
//! ```

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of one conversation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoopPhase {
    AwaitingModel,
    ModelResponded,
    ToolRequested,
    ToolExecuting,
    ToolResolved,
    Done,
    Aborted,
}

impl LoopPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopPhase::Done | LoopPhase::Aborted)
    }

    /// Legal successor phases.
    ///
    /// `ToolExecuting` cannot abort directly: an issued tool call always
    /// resolves before the loop may stop.
    pub fn can_transition_to(&self, next: LoopPhase) -> bool {
        use LoopPhase::*;
        matches!(
            (self, next),
            (AwaitingModel, ModelResponded)
                | (AwaitingModel, Aborted)
                | (ModelResponded, Done)
                | (ModelResponded, ToolRequested)
                | (ModelResponded, Aborted)
                | (ToolRequested, ToolExecuting)
                | (ToolRequested, Aborted)
                | (ToolExecuting, ToolResolved)
                | (ToolResolved, ToolExecuting)
                | (ToolResolved, AwaitingModel)
                | (ToolResolved, Aborted)
        )
    }
}

impl fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopPhase::AwaitingModel => "AWAITING_MODEL",
            LoopPhase::ModelResponded => "MODEL_RESPONDED",
            LoopPhase::ToolRequested => "TOOL_REQUESTED",
            LoopPhase::ToolExecuting => "TOOL_EXECUTING",
            LoopPhase::ToolResolved => "TOOL_RESOLVED",
            LoopPhase::Done => "DONE",
            LoopPhase::Aborted => "ABORTED",
        };
        f.write_str(name)
    }
}

/// Tracks the current phase and completed tool rounds against a ceiling.
#[derive(Debug, Clone)]
pub struct LoopMachine {
    phase: LoopPhase,
    tool_rounds: usize,
    max_iterations: usize,
}

impl LoopMachine {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            phase: LoopPhase::AwaitingModel,
            tool_rounds: 0,
            max_iterations,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn tool_rounds(&self) -> usize {
        self.tool_rounds
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn advance(&mut self, next: LoopPhase) -> Result<(), DomainError> {
        if !self.phase.can_transition_to(next) {
            return Err(DomainError::IllegalTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        if next == LoopPhase::ToolRequested {
            self.tool_rounds += 1;
        }
        self.phase = next;
        Ok(())
    }

    /// True once the configured number of tool rounds has been spent.
    pub fn ceiling_reached(&self) -> bool {
        self.tool_rounds >= self.max_iterations
    }
}
