//! Conversation Loop use case.
//!
//! Drives one provider through the bounded request → tool-use → result →
//! re-request cycle for a single query:
//!
//! ```text
//! AWAITING_MODEL → MODEL_RESPONDED → (TOOL_REQUESTED → TOOL_EXECUTING → TOOL_RESOLVED → AWAITING_MODEL)* → DONE | ABORTED
//! ```
//!
//! Tool calls from one turn run strictly one after another, in the order the
//! provider emitted them. A failing tool never ends the loop; its error is
//! appended as a flagged tool result for the model to read. Only provider
//! failures are fatal.
//!
//! Cancellation (token or timeout) is checked before every provider call and
//! before every tool call. A provider call in flight is abandoned; a tool call
//! in flight is allowed to finish.

use crate::config::ExecutionParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::model_provider::{ModelProvider, ProviderError};
use crate::ports::progress::{LoopProgressNotifier, NoProgress};
use crate::use_cases::tool_context::ToolContext;
use relay_domain::tool::sanitizer::sanitize_error;
use relay_domain::util::preview;
use relay_domain::{
    ConversationState, DomainError, FailureKind, LoopMachine, LoopPhase, ProviderId,
    ProviderResult, ToolInvocation, UsageMetrics,
};
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fatal errors for a single conversation loop
#[derive(Error, Debug)]
pub enum LoopError {
    #[error("Provider '{provider}' unreachable: {source}")]
    ProviderUnreachable {
        provider: ProviderId,
        #[source]
        source: ProviderError,
    },

    #[error("Provider '{provider}' returned an unusable response: {message}")]
    InvalidProviderResponse {
        provider: ProviderId,
        message: String,
    },
}

impl LoopError {
    pub fn provider(&self) -> ProviderId {
        match self {
            LoopError::ProviderUnreachable { provider, .. }
            | LoopError::InvalidProviderResponse { provider, .. } => *provider,
        }
    }

    /// Failure record suitable for a settled broadcast result set.
    pub fn to_provider_result(&self) -> ProviderResult {
        let kind = match self {
            LoopError::ProviderUnreachable { .. } => FailureKind::ProviderUnreachable,
            LoopError::InvalidProviderResponse { .. } => FailureKind::InvalidResponse,
        };
        ProviderResult::failed(self.provider(), kind, self.to_string())
    }
}

/// One provider's bounded conversation loop.
///
/// Cheap to construct; the router builds one per run. Everything it holds is
/// shared and read-only, so a loop may be moved into a spawned task.
pub struct ConversationLoop {
    provider: Arc<dyn ModelProvider>,
    tools: Arc<ToolContext>,
    params: ExecutionParams,
    size_limit: usize,
    progress: Arc<dyn LoopProgressNotifier>,
    conversation_logger: Arc<dyn ConversationLogger>,
    cancellation_token: Option<CancellationToken>,
}

impl ConversationLoop {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        tools: Arc<ToolContext>,
        params: ExecutionParams,
        size_limit: usize,
    ) -> Self {
        Self {
            provider,
            tools,
            params,
            size_limit,
            progress: Arc::new(NoProgress),
            conversation_logger: Arc::new(NoConversationLogger),
            cancellation_token: None,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn LoopProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Run the loop for `query` on a fresh conversation.
    pub async fn run(&self, query: &str) -> Result<ProviderResult, LoopError> {
        let provider = self.provider.id();
        info!(
            "Starting conversation with {} ({}): {}",
            provider,
            self.provider.model(),
            preview(query, 80)
        );
        self.progress.on_loop_start(provider);
        self.log(
            "loop_started",
            json!({
                "provider": provider,
                "model": self.provider.model(),
                "query": query,
                "max_iterations": self.params.max_iterations,
            }),
        );

        let outcome = self.drive(query).await;

        match &outcome {
            Ok(result) => {
                info!(
                    "{} finished: {:?} after {} tool rounds",
                    provider, result.termination, result.iteration_count
                );
                self.progress.on_loop_complete(provider, result);
                self.log(
                    "loop_finished",
                    json!({
                        "provider": provider,
                        "termination": result.termination,
                        "iterations": result.iteration_count,
                        "usage": result.usage,
                        "text": result.final_text,
                    }),
                );
            }
            Err(e) => {
                warn!("Conversation with {} failed: {}", provider, e);
                let failed = e.to_provider_result();
                self.progress.on_loop_complete(provider, &failed);
                self.log(
                    "loop_finished",
                    json!({
                        "provider": provider,
                        "termination": failed.termination,
                        "error": failed.error,
                    }),
                );
            }
        }

        outcome
    }

    async fn drive(&self, query: &str) -> Result<ProviderResult, LoopError> {
        let provider = self.provider.id();
        let deadline = self.params.timeout.map(|t| Instant::now() + t);
        let tools = self.tools.schemas_for(self.provider.dialect());

        let mut state = ConversationState::new(query);
        let mut machine = LoopMachine::new(self.params.max_iterations);
        let mut usage = UsageMetrics::default();
        let mut last_text = String::new();
        let mut model: Option<String> = None;

        loop {
            if self.is_interrupted(deadline) {
                return self.abort_cancelled(&mut machine, &last_text, usage, model);
            }

            let round = machine.tool_rounds();
            self.progress.on_model_request(provider, round);
            self.log(
                "model_request",
                json!({ "provider": provider, "round": round, "messages": state.len() }),
            );

            let turn = tokio::select! {
                biased;
                _ = interrupted(self.cancellation_token.as_ref(), deadline) => {
                    debug!("{} interrupted while awaiting the model", provider);
                    return self.abort_cancelled(&mut machine, &last_text, usage, model);
                }
                sent = self.provider.send_turn(&state, &tools) => {
                    sent.map_err(|e| self.provider_error(e))?
                }
            };

            self.advance(&mut machine, LoopPhase::ModelResponded)?;
            usage.accumulate(turn.usage);
            if turn.model.is_some() {
                model = turn.model.clone();
            }
            let text = turn.text();
            if !text.trim().is_empty() {
                last_text = text.clone();
            }
            self.log(
                "model_response",
                json!({
                    "provider": provider,
                    "round": round,
                    "text": text,
                    "tool_uses": turn.tool_uses().len(),
                    "stop_reason": turn.stop_reason,
                    "usage": turn.usage,
                }),
            );

            if !turn.has_tool_uses() {
                self.advance(&mut machine, LoopPhase::Done)?;
                let result =
                    ProviderResult::completed(provider, text, usage, machine.tool_rounds());
                return Ok(self.finish(result, model));
            }

            if machine.ceiling_reached() {
                warn!(
                    "{} still requesting tools after {} rounds; stopping",
                    provider,
                    machine.max_iterations()
                );
                self.advance(&mut machine, LoopPhase::Aborted)?;
                let result = ProviderResult::iteration_limited(
                    provider,
                    &last_text,
                    usage,
                    machine.tool_rounds(),
                );
                return Ok(self.finish(result, model));
            }

            self.advance(&mut machine, LoopPhase::ToolRequested)?;
            let invocations: Vec<ToolInvocation> = turn
                .tool_uses()
                .into_iter()
                .map(|(id, name, input)| ToolInvocation::open(id, name, input.clone()))
                .collect();
            state
                .push_assistant(turn.content)
                .map_err(|e| self.conversation_error(e))?;

            debug!(
                "{} round {}: {} tool calls",
                provider,
                machine.tool_rounds(),
                invocations.len()
            );

            for invocation in invocations {
                if self.is_interrupted(deadline) {
                    let skipped = invocation.close(
                        sanitize_error(
                            "skipped: run cancelled before this call was issued",
                            self.size_limit,
                        ),
                        true,
                    );
                    state
                        .push_tool_result(&skipped)
                        .map_err(|e| self.conversation_error(e))?;
                    continue;
                }

                self.advance(&mut machine, LoopPhase::ToolExecuting)?;
                self.progress.on_tool_start(provider, &invocation.tool_name);
                self.log(
                    "tool_call",
                    json!({
                        "provider": provider,
                        "id": invocation.id,
                        "tool": invocation.tool_name,
                        "arguments": invocation.arguments,
                    }),
                );

                let closed = self
                    .tools
                    .invoke(invocation, self.params.validate_arguments, self.size_limit)
                    .await;

                let result_text = closed.result_text();
                self.progress
                    .on_tool_complete(provider, &closed.tool_name, closed.is_error());
                self.log(
                    "tool_result",
                    json!({
                        "provider": provider,
                        "id": closed.id,
                        "tool": closed.tool_name,
                        "is_error": closed.is_error(),
                        "bytes": result_text.len(),
                        "text": result_text,
                    }),
                );

                state
                    .push_tool_result(&closed)
                    .map_err(|e| self.conversation_error(e))?;
                self.advance(&mut machine, LoopPhase::ToolResolved)?;
            }

            if self.is_interrupted(deadline) {
                return self.abort_cancelled(&mut machine, &last_text, usage, model);
            }
            self.advance(&mut machine, LoopPhase::AwaitingModel)?;
        }
    }

    fn is_interrupted(&self, deadline: Option<Instant>) -> bool {
        self.cancellation_token
            .as_ref()
            .is_some_and(|t| t.is_cancelled())
            || deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn abort_cancelled(
        &self,
        machine: &mut LoopMachine,
        last_text: &str,
        usage: UsageMetrics,
        model: Option<String>,
    ) -> Result<ProviderResult, LoopError> {
        info!("{} run cancelled", self.provider.id());
        self.advance(machine, LoopPhase::Aborted)?;
        let result =
            ProviderResult::cancelled(self.provider.id(), last_text, usage, machine.tool_rounds());
        Ok(self.finish(result, model))
    }

    fn finish(&self, result: ProviderResult, model: Option<String>) -> ProviderResult {
        result.with_model(model.unwrap_or_else(|| self.provider.model().to_string()))
    }

    fn advance(&self, machine: &mut LoopMachine, next: LoopPhase) -> Result<(), LoopError> {
        machine
            .advance(next)
            .map_err(|e| self.conversation_error(e))
    }

    fn provider_error(&self, source: ProviderError) -> LoopError {
        let provider = self.provider.id();
        if source.is_invalid_response() {
            LoopError::InvalidProviderResponse {
                provider,
                message: source.to_string(),
            }
        } else {
            LoopError::ProviderUnreachable { provider, source }
        }
    }

    fn conversation_error(&self, error: DomainError) -> LoopError {
        LoopError::InvalidProviderResponse {
            provider: self.provider.id(),
            message: error.to_string(),
        }
    }

    fn log(&self, event_type: &'static str, payload: Value) {
        self.conversation_logger
            .log(ConversationEvent::new(event_type, payload));
    }
}

/// Resolves once the token is cancelled or the deadline passes.
async fn interrupted(token: Option<&CancellationToken>, deadline: Option<Instant>) {
    let cancelled = async {
        match token {
            Some(token) => token.cancelled().await,
            None => std::future::pending::<()>().await,
        }
    };
    let expired = async {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::select! {
        _ = cancelled => {}
        _ = expired => {}
    }
}
