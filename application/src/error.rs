//! Orchestrator-level errors.
//!
//! Tool failures never show up here: they are data inside the conversation.
//! Iteration-limit and cancellation outcomes are not errors either; they are
//! [`Termination`](relay_domain::Termination) variants on a result.

use crate::ports::model_provider::ProviderError;
use crate::use_cases::conversation_loop::LoopError;
use relay_domain::ProviderId;
use thiserror::Error;

/// Errors surfaced to the caller of the router and catalog use cases
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The backend could not enumerate its tools. Fatal for the session.
    #[error("Tool catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// The requested provider has no credentials or is switched off.
    #[error("Provider '{0}' is disabled (no credentials or turned off in configuration)")]
    ProviderDisabled(ProviderId),

    #[error("No providers are enabled")]
    NoProvidersEnabled,

    /// Transport-level failure talking to a provider.
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

impl From<LoopError> for OrchestratorError {
    fn from(error: LoopError) -> Self {
        match error {
            LoopError::ProviderUnreachable { provider, source } => {
                OrchestratorError::ProviderUnreachable { provider, source }
            }
            LoopError::InvalidProviderResponse { provider, message } => {
                OrchestratorError::InvalidProviderResponse { provider, message }
            }
        }
    }
}
