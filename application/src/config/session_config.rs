//! Session configuration read once at startup.

use super::execution_params::ExecutionParams;
use relay_domain::{ProviderId, SizeLimits};

/// Which providers may be used, and how large tool output may be.
///
/// Built by the composition root from file/env configuration, then handed to
/// the router, which reads it exactly once.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    enabled: Vec<ProviderId>,
    pub limits: SizeLimits,
    pub execution: ExecutionParams,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a provider as enabled (idempotent).
    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        if !self.enabled.contains(&provider) {
            self.enabled.push(provider);
        }
        self
    }

    pub fn with_limits(mut self, limits: SizeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_execution(mut self, execution: ExecutionParams) -> Self {
        self.execution = execution;
        self
    }

    pub fn is_enabled(&self, provider: ProviderId) -> bool {
        self.enabled.contains(&provider)
    }

    pub fn enabled_providers(&self) -> &[ProviderId] {
        &self.enabled
    }

    /// Byte cap for sanitized tool output under the configured profile.
    pub fn size_limit(&self) -> usize {
        self.limits.for_profile(self.execution.client_profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::ClientProfile;

    #[test]
    fn test_enablement() {
        let config = SessionConfig::new()
            .with_provider(ProviderId::Claude)
            .with_provider(ProviderId::Claude)
            .with_provider(ProviderId::Gemini);
        assert_eq!(
            config.enabled_providers(),
            &[ProviderId::Claude, ProviderId::Gemini]
        );
        assert!(!config.is_enabled(ProviderId::OpenAi));
    }

    #[test]
    fn test_size_limit_follows_profile() {
        let config = SessionConfig::new().with_execution(
            ExecutionParams::default().with_client_profile(ClientProfile::Constrained),
        );
        assert_eq!(config.size_limit(), SizeLimits::default().constrained);
    }
}
