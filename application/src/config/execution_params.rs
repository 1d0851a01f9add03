//! Execution parameters — conversation loop control.
//!
//! [`ExecutionParams`] groups the static parameters that bound a single
//! [`ConversationLoop`](crate::use_cases::conversation_loop::ConversationLoop)
//! run. These are application-layer concerns, not domain policy.

use relay_domain::ClientProfile;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default ceiling on tool rounds per run.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// Conversation loop control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Maximum tool rounds before the run is cut off with a best-effort answer.
    pub max_iterations: usize,
    /// Wall-clock budget for one run; `None` means unbounded.
    pub timeout: Option<Duration>,
    /// Check tool arguments against the declared schema before invoking.
    pub validate_arguments: bool,
    /// Which output cap applies to tool results.
    pub client_profile: ClientProfile,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            timeout: None,
            validate_arguments: true,
            client_profile: ClientProfile::Server,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_validate_arguments(mut self, validate: bool) -> Self {
        self.validate_arguments = validate;
        self
    }

    pub fn with_client_profile(mut self, profile: ClientProfile) -> Self {
        self.client_profile = profile;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = ExecutionParams::default();
        assert_eq!(params.max_iterations, 5);
        assert!(params.timeout.is_none());
        assert!(params.validate_arguments);
        assert_eq!(params.client_profile, ClientProfile::Server);
    }

    #[test]
    fn test_builder_chain() {
        let params = ExecutionParams::default()
            .with_max_iterations(2)
            .with_timeout(Some(Duration::from_secs(30)))
            .with_validate_arguments(false)
            .with_client_profile(ClientProfile::Constrained);

        assert_eq!(params.max_iterations, 2);
        assert_eq!(params.timeout, Some(Duration::from_secs(30)));
        assert!(!params.validate_arguments);
        assert_eq!(params.client_profile, ClientProfile::Constrained);
    }
}
