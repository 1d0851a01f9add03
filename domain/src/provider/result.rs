//! The outcome of one conversation loop.

use super::ProviderId;
use crate::conversation::response::UsageMetrics;
use serde::{Deserialize, Serialize};

/// Appended to the best-effort answer when the tool-round ceiling is hit.
pub const ITERATION_LIMIT_MARKER: &str = "[iteration limit reached]";
/// Appended to the best-effort answer when a run is cancelled or times out.
pub const CANCELLED_MARKER: &str = "[cancelled]";

/// How a loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The model produced a final answer
    Completed,
    /// The tool-round ceiling was reached; the answer is best-effort
    IterationLimitExceeded,
    /// Cancelled or timed out; the answer is best-effort
    Cancelled,
    /// The loop failed; see `error`
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ProviderUnreachable,
    InvalidResponse,
    /// The loop task itself panicked or was aborted
    Crashed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Result of running one provider's conversation loop.
///
/// Always carries the provider id plus either `final_text` or `error`, so
/// callers can render partial success across a broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    pub provider: ProviderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_text: Option<String>,
    pub usage: UsageMetrics,
    /// Number of tool rounds executed
    pub iteration_count: usize,
    pub termination: Termination,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderFailure>,
}

impl ProviderResult {
    pub fn completed(
        provider: ProviderId,
        text: impl Into<String>,
        usage: UsageMetrics,
        iteration_count: usize,
    ) -> Self {
        Self {
            provider,
            model: None,
            final_text: Some(text.into()),
            usage,
            iteration_count,
            termination: Termination::Completed,
            error: None,
        }
    }

    /// Best-effort result after hitting the ceiling.
    pub fn iteration_limited(
        provider: ProviderId,
        best_effort: &str,
        usage: UsageMetrics,
        iteration_count: usize,
    ) -> Self {
        Self {
            final_text: Some(with_marker(best_effort, ITERATION_LIMIT_MARKER)),
            termination: Termination::IterationLimitExceeded,
            ..Self::completed(provider, "", usage, iteration_count)
        }
    }

    /// Best-effort result after cancellation.
    pub fn cancelled(
        provider: ProviderId,
        best_effort: &str,
        usage: UsageMetrics,
        iteration_count: usize,
    ) -> Self {
        Self {
            final_text: Some(with_marker(best_effort, CANCELLED_MARKER)),
            termination: Termination::Cancelled,
            ..Self::completed(provider, "", usage, iteration_count)
        }
    }

    pub fn failed(provider: ProviderId, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            provider,
            model: None,
            final_text: None,
            usage: UsageMetrics::default(),
            iteration_count: 0,
            termination: Termination::Failed,
            error: Some(ProviderFailure {
                kind,
                message: message.into(),
            }),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// True only for a normally completed run.
    pub fn is_success(&self) -> bool {
        self.termination == Termination::Completed && self.error.is_none()
    }

    pub fn text(&self) -> &str {
        self.final_text.as_deref().unwrap_or("")
    }
}

fn with_marker(text: &str, marker: &str) -> String {
    let text = text.trim_end();
    if text.is_empty() {
        marker.to_string()
    } else {
        format!("{}\n\n{}", text, marker)
    }
}
