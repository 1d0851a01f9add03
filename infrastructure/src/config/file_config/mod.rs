//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod backend;
mod execution;
mod logging;
mod output;
mod providers;

pub use backend::{BackendLaunch, FileBackendConfig};
pub use execution::{FileExecutionConfig, FileLimitsConfig};
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use providers::{
    AzureSettings, FileAzureConfig, FileProviderConfig, FileProvidersConfig, ProviderSettings,
};

use super::ConfigError;
use relay_application::SessionConfig;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Per-provider credentials, endpoints and models
    pub providers: FileProvidersConfig,
    /// Conversation loop bounds
    pub execution: FileExecutionConfig,
    /// Tool output caps per client profile
    pub limits: FileLimitsConfig,
    /// MCP tool server launch settings
    pub backend: FileBackendConfig,
    /// Transcript and diagnostic log files
    pub logging: FileLoggingConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Reject values that would make every run fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execution.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "execution.max_iterations must be at least 1".into(),
            ));
        }
        if self.execution.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "execution.timeout_secs cannot be 0".into(),
            ));
        }
        if self.backend.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "backend.request_timeout_secs cannot be 0".into(),
            ));
        }
        for id in relay_domain::ProviderId::all() {
            if self.providers.get(id).timeout_secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "providers.{}.timeout_secs cannot be 0",
                    id
                )));
            }
        }
        Ok(())
    }

    /// Freeze enablement and limits for one session.
    ///
    /// `providers` are the resolved settings; only usable ones are enabled.
    pub fn session_config(&self, providers: &[ProviderSettings]) -> SessionConfig {
        providers
            .iter()
            .filter(|p| p.is_usable())
            .fold(SessionConfig::new(), |config, p| config.with_provider(p.id))
            .with_limits(self.limits.to_limits())
            .with_execution(self.execution.to_params())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::{ClientProfile, ProviderId};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[providers.openai]
base_url = "http://localhost:11434/v1"
model = "llama3.1"

[providers.gemini]
enabled = false

[execution]
max_iterations = 8
client_profile = "constrained"

[limits]
constrained = 20000

[backend]
command = "node"
args = ["src/index.js"]
env = { ZENDESK_SUBDOMAIN = "acme" }

[logging]
conversation_log = "logs/transcript.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.openai.model.as_deref(), Some("llama3.1"));
        assert!(!config.providers.gemini.enabled);
        assert!(config.providers.claude.enabled);
        assert_eq!(config.execution.max_iterations, 8);
        assert_eq!(config.execution.client_profile, ClientProfile::Constrained);
        assert_eq!(config.limits.constrained, 20_000);
        assert_eq!(config.limits.server, 500_000);
        assert_eq!(config.backend.env["ZENDESK_SUBDOMAIN"], "acme");
        assert_eq!(config.backend.request_timeout_secs, 60);
        assert!(config.logging.conversation_log.is_some());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.output.color);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let mut config = FileConfig::default();
        config.execution.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_provider_timeout_rejected() {
        let mut config = FileConfig::default();
        config.providers.claude.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("providers.claude.timeout_secs"));
    }

    #[test]
    fn test_session_config_enables_only_usable_providers() {
        let mut config = FileConfig::default();
        config.providers.gemini.enabled = false;
        config.execution.client_profile = ClientProfile::Constrained;

        let resolved = config.providers.resolve_all(|name| match name {
            "ANTHROPIC_API_KEY" | "GOOGLE_API_KEY" => Some("k".to_string()),
            _ => None,
        });
        let session = config.session_config(&resolved);

        assert_eq!(session.enabled_providers(), &[ProviderId::Claude]);
        assert_eq!(session.size_limit(), 50_000);
    }
}
