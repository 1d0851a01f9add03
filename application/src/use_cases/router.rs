//! Multi-Provider Router use case.
//!
//! Dispatches a query to one provider or fans it out to every enabled one.
//! The enabled set is computed once, at construction, from the
//! [`SessionConfig`] and the adapters actually available; it never changes
//! for the router's lifetime.

use crate::config::{ExecutionParams, SessionConfig};
use crate::error::OrchestratorError;
use crate::ports::conversation_logger::{ConversationLogger, NoConversationLogger};
use crate::ports::model_provider::ModelProvider;
use crate::ports::progress::{LoopProgressNotifier, NoProgress};
use crate::use_cases::conversation_loop::ConversationLoop;
use crate::use_cases::tool_context::ToolContext;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use relay_domain::{ConsensusSummary, FailureKind, ProviderId, ProviderResult, analyze};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a query is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMode {
    /// Exactly this provider; fails if it is disabled
    Single(ProviderId),
    /// Every enabled provider, concurrently
    Broadcast,
    /// The preferred provider when enabled, otherwise the first enabled one
    Auto { preferred: Option<ProviderId> },
}

/// What [`MultiProviderRouter::route`] returns
#[derive(Debug, Clone)]
pub enum RouteOutcome {
    Single(ProviderResult),
    /// One entry per enabled provider, in enablement order
    Broadcast(Vec<ProviderResult>),
}

impl RouteOutcome {
    pub fn results(&self) -> &[ProviderResult] {
        match self {
            RouteOutcome::Single(result) => std::slice::from_ref(result),
            RouteOutcome::Broadcast(results) => results,
        }
    }

    pub fn into_results(self) -> Vec<ProviderResult> {
        match self {
            RouteOutcome::Single(result) => vec![result],
            RouteOutcome::Broadcast(results) => results,
        }
    }
}

/// Availability of one provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub provider: ProviderId,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Why the provider is unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Snapshot of the router's frozen configuration
#[derive(Debug, Clone, Serialize)]
pub struct RouterStatus {
    pub providers: Vec<ProviderStatus>,
    pub tool_count: usize,
    pub tools: Vec<String>,
    pub max_iterations: usize,
    pub size_limit: usize,
}

impl RouterStatus {
    pub fn enabled(&self) -> impl Iterator<Item = &ProviderStatus> {
        self.providers.iter().filter(|p| p.enabled)
    }
}

/// Broadcast results plus their lexical comparison
#[derive(Debug, Clone, Serialize)]
pub struct ConsensusReport {
    pub query: String,
    pub results: Vec<ProviderResult>,
    pub summary: ConsensusSummary,
    pub timestamp: DateTime<Utc>,
}

/// Routes queries to conversation loops over the enabled providers
pub struct MultiProviderRouter {
    /// Enabled adapters, in [`ProviderId::all`] order
    enabled: Vec<Arc<dyn ModelProvider>>,
    disabled: Vec<(ProviderId, &'static str)>,
    tools: Arc<ToolContext>,
    params: ExecutionParams,
    size_limit: usize,
    progress: Arc<dyn LoopProgressNotifier>,
    conversation_logger: Arc<dyn ConversationLogger>,
    cancellation_token: Option<CancellationToken>,
}

impl MultiProviderRouter {
    /// Freeze the enabled set: a provider is enabled when the session enables
    /// it and an adapter for it was supplied.
    pub fn new(
        providers: Vec<Arc<dyn ModelProvider>>,
        tools: Arc<ToolContext>,
        session: &SessionConfig,
    ) -> Self {
        let mut by_id: HashMap<ProviderId, Arc<dyn ModelProvider>> =
            providers.into_iter().map(|p| (p.id(), p)).collect();

        let mut enabled = Vec::new();
        let mut disabled = Vec::new();
        for id in ProviderId::all() {
            match (session.is_enabled(id), by_id.remove(&id)) {
                (true, Some(provider)) => enabled.push(provider),
                (true, None) => disabled.push((id, "no adapter available")),
                (false, _) => disabled.push((id, "not configured")),
            }
        }

        info!(
            "Router ready: {} enabled ({}), {} tools",
            enabled.len(),
            enabled
                .iter()
                .map(|p| p.id().as_str())
                .collect::<Vec<_>>()
                .join(", "),
            tools.catalog().len()
        );

        Self {
            enabled,
            disabled,
            tools,
            params: session.execution.clone(),
            size_limit: session.size_limit(),
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

    /// Token shared by every loop this router starts.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn enabled_providers(&self) -> Vec<ProviderId> {
        self.enabled.iter().map(|p| p.id()).collect()
    }

    pub fn is_enabled(&self, provider: ProviderId) -> bool {
        self.find(provider).is_some()
    }

    pub async fn route(
        &self,
        query: &str,
        mode: RouteMode,
    ) -> Result<RouteOutcome, OrchestratorError> {
        match mode {
            RouteMode::Single(provider) => {
                let provider = self
                    .find(provider)
                    .ok_or(OrchestratorError::ProviderDisabled(provider))?;
                self.run_single(provider, query).await
            }
            RouteMode::Auto { preferred } => {
                let provider = preferred
                    .and_then(|id| self.find(id))
                    .or_else(|| self.enabled.first())
                    .ok_or(OrchestratorError::NoProvidersEnabled)?;
                if let Some(id) = preferred
                    && id != provider.id()
                {
                    debug!("{} is disabled, falling back to {}", id, provider.id());
                }
                self.run_single(provider, query).await
            }
            RouteMode::Broadcast => Ok(RouteOutcome::Broadcast(self.broadcast(query).await?)),
        }
    }

    /// Broadcast and compare the answers.
    pub async fn consensus(&self, query: &str) -> Result<ConsensusReport, OrchestratorError> {
        let results = self.broadcast(query).await?;
        let summary = analyze(&results);
        info!(
            "Consensus over {} results: {} ({:?})",
            results.len(),
            summary.conclusion,
            summary.confidence
        );
        Ok(ConsensusReport {
            query: query.to_string(),
            results,
            summary,
            timestamp: Utc::now(),
        })
    }

    pub fn status(&self) -> RouterStatus {
        let mut providers: Vec<ProviderStatus> = self
            .enabled
            .iter()
            .map(|p| ProviderStatus {
                provider: p.id(),
                enabled: true,
                model: Some(p.model().to_string()),
                reason: None,
            })
            .chain(self.disabled.iter().map(|(id, reason)| ProviderStatus {
                provider: *id,
                enabled: false,
                model: None,
                reason: Some(reason.to_string()),
            }))
            .collect();
        providers.sort_by_key(|p| p.provider);

        RouterStatus {
            providers,
            tool_count: self.tools.catalog().len(),
            tools: self
                .tools
                .catalog()
                .names()
                .into_iter()
                .map(String::from)
                .collect(),
            max_iterations: self.params.max_iterations,
            size_limit: self.size_limit,
        }
    }

    fn find(&self, provider: ProviderId) -> Option<&Arc<dyn ModelProvider>> {
        self.enabled.iter().find(|p| p.id() == provider)
    }

    fn conversation(&self, provider: &Arc<dyn ModelProvider>) -> ConversationLoop {
        let conversation = ConversationLoop::new(
            Arc::clone(provider),
            Arc::clone(&self.tools),
            self.params.clone(),
            self.size_limit,
        )
        .with_progress(Arc::clone(&self.progress))
        .with_conversation_logger(Arc::clone(&self.conversation_logger));

        match &self.cancellation_token {
            Some(token) => conversation.with_cancellation(token.clone()),
            None => conversation,
        }
    }

    async fn run_single(
        &self,
        provider: &Arc<dyn ModelProvider>,
        query: &str,
    ) -> Result<RouteOutcome, OrchestratorError> {
        let result = self.conversation(provider).run(query).await?;
        Ok(RouteOutcome::Single(result))
    }

    /// Run one isolated loop per enabled provider and settle all of them.
    async fn broadcast(&self, query: &str) -> Result<Vec<ProviderResult>, OrchestratorError> {
        if self.enabled.is_empty() {
            return Err(OrchestratorError::NoProvidersEnabled);
        }

        info!("Broadcasting to {} providers", self.enabled.len());
        let mut join_set = JoinSet::new();

        for provider in &self.enabled {
            let id = provider.id();
            let conversation = self.conversation(provider);
            let query = query.to_string();

            join_set.spawn(async move {
                let outcome = AssertUnwindSafe(conversation.run(&query))
                    .catch_unwind()
                    .await;
                (id, outcome)
            });
        }

        let mut settled: HashMap<ProviderId, ProviderResult> = HashMap::new();

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((id, Ok(Ok(result)))) => {
                    debug!("{} settled: {:?}", id, result.termination);
                    settled.insert(id, result);
                }
                Ok((id, Ok(Err(e)))) => {
                    warn!("{} failed: {}", id, e);
                    settled.insert(id, e.to_provider_result());
                }
                Ok((id, Err(panic))) => {
                    let message = panic_message(panic.as_ref());
                    warn!("{} loop panicked: {}", id, message);
                    let crashed = ProviderResult::failed(
                        id,
                        FailureKind::Crashed,
                        format!("Conversation loop panicked: {}", message),
                    );
                    self.progress.on_loop_complete(id, &crashed);
                    settled.insert(id, crashed);
                }
                Err(e) => {
                    warn!("Task join error: {}", e);
                }
            }
        }

        Ok(self
            .enabled
            .iter()
            .map(|provider| {
                let id = provider.id();
                settled.remove(&id).unwrap_or_else(|| {
                    ProviderResult::failed(
                        id,
                        FailureKind::Crashed,
                        "Conversation loop did not complete",
                    )
                })
            })
            .collect())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
