//! Provider configuration from TOML (`[providers]` section)

use relay_domain::ProviderId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One provider's raw settings.
///
/// Unset fields fall back to per-provider defaults at resolution time, so a
/// file may override just `model` without restating the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Turn the provider off even when a credential is present
    pub enabled: bool,
    /// Direct API key (not recommended; prefer `api_key_env`)
    pub api_key: Option<String>,
    /// Environment variables searched, in order, for the API key
    pub api_key_env: Option<Vec<String>>,
    /// API base URL (e.g. an OpenAI-compatible gateway)
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    /// HTTP request timeout
    pub timeout_secs: u64,
    /// Azure OpenAI deployment (OpenAI only)
    pub azure: FileAzureConfig,
}

/// Azure OpenAI settings; unset fields fall back to `AZURE_OPENAI_*` variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAzureConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: Option<String>,
    /// Deployment name; defaults to the model
    pub deployment: Option<String>,
    /// Sent as the `api-version` query parameter
    pub api_version: Option<String>,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            api_key_env: None,
            base_url: None,
            model: None,
            max_tokens: None,
            timeout_secs: 120,
            azure: FileAzureConfig::default(),
        }
    }
}

/// Fully resolved provider settings, ready for an adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub id: ProviderId,
    /// `None` when no credential could be found
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub enabled: bool,
    /// Set when requests go to an Azure OpenAI deployment
    pub azure: Option<AzureSettings>,
}

/// Resolved Azure OpenAI deployment. `base_url` already points at it.
#[derive(Debug, Clone, PartialEq)]
pub struct AzureSettings {
    pub deployment: String,
    pub api_version: Option<String>,
}

impl ProviderSettings {
    /// Enabled in configuration and holding a credential.
    pub fn is_usable(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Why the provider cannot be used, if it cannot.
    pub fn unusable_reason(&self) -> Option<String> {
        if !self.enabled {
            Some("disabled in configuration".to_string())
        } else if !self.is_usable() {
            Some("no API key".to_string())
        } else {
            None
        }
    }
}

struct Defaults {
    key_env: &'static [&'static str],
    base_url: &'static str,
    model: &'static str,
    max_tokens: u32,
}

fn defaults(id: ProviderId) -> Defaults {
    match id {
        ProviderId::OpenAi => Defaults {
            key_env: &["AZURE_OPENAI_API_KEY", "OPENAI_API_KEY"],
            base_url: "https://api.openai.com/v1",
            model: "gpt-4o",
            max_tokens: 4096,
        },
        ProviderId::Claude => Defaults {
            key_env: &["ANTHROPIC_API_KEY", "CLAUDE_API_KEY"],
            base_url: "https://api.anthropic.com",
            model: "claude-3-5-sonnet-20241022",
            max_tokens: 4000,
        },
        ProviderId::Gemini => Defaults {
            key_env: &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
            base_url: "https://generativelanguage.googleapis.com/v1beta",
            model: "gemini-1.5-pro",
            max_tokens: 8192,
        },
    }
}

impl FileProviderConfig {
    /// Resolve against `id`'s defaults, reading credentials through `env`.
    pub fn resolve(
        &self,
        id: ProviderId,
        env: impl Fn(&str) -> Option<String>,
    ) -> ProviderSettings {
        let defaults = defaults(id);

        let lookup = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let api_key = non_blank(self.api_key.clone()).or_else(|| match &self.api_key_env {
            Some(names) => names.iter().find_map(|name| lookup(name.as_str())),
            None => defaults.key_env.iter().find_map(|name| lookup(*name)),
        });
        let model = self
            .model
            .clone()
            .unwrap_or_else(|| defaults.model.to_string());

        let azure_endpoint = match id {
            ProviderId::OpenAi => non_blank(self.azure.endpoint.clone()).or_else(|| {
                self.base_url
                    .is_none()
                    .then(|| lookup("AZURE_OPENAI_ENDPOINT"))
                    .flatten()
            }),
            _ => None,
        };

        let (base_url, azure) = match azure_endpoint {
            Some(endpoint) => {
                let deployment = non_blank(self.azure.deployment.clone())
                    .or_else(|| lookup("AZURE_OPENAI_DEPLOYMENT_NAME"))
                    .unwrap_or_else(|| model.clone());
                let api_version = non_blank(self.azure.api_version.clone())
                    .or_else(|| lookup("AZURE_OPENAI_API_VERSION"));
                (
                    format!(
                        "{}/openai/deployments/{}",
                        endpoint.trim_end_matches('/'),
                        deployment
                    ),
                    Some(AzureSettings {
                        deployment,
                        api_version,
                    }),
                )
            }
            None => (
                self.base_url
                    .clone()
                    .unwrap_or_else(|| defaults.base_url.to_string()),
                None,
            ),
        };

        ProviderSettings {
            id,
            api_key,
            base_url,
            model,
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            timeout: Duration::from_secs(self.timeout_secs),
            enabled: self.enabled,
            azure,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub openai: FileProviderConfig,
    pub claude: FileProviderConfig,
    pub gemini: FileProviderConfig,
    /// Provider used by `ask` when none is given
    pub default: Option<ProviderId>,
}

impl FileProvidersConfig {
    pub fn get(&self, id: ProviderId) -> &FileProviderConfig {
        match id {
            ProviderId::OpenAi => &self.openai,
            ProviderId::Claude => &self.claude,
            ProviderId::Gemini => &self.gemini,
        }
    }

    /// Resolve every provider, in [`ProviderId::all`] order.
    pub fn resolve_all(&self, env: impl Fn(&str) -> Option<String>) -> Vec<ProviderSettings> {
        ProviderId::all()
            .into_iter()
            .map(|id| self.get(id).resolve(id, &env))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_per_provider() {
        let settings = FileProviderConfig::default().resolve(ProviderId::Claude, env_of(&[]));
        assert_eq!(settings.model, "claude-3-5-sonnet-20241022");
        assert_eq!(settings.max_tokens, 4000);
        assert_eq!(settings.base_url, "https://api.anthropic.com");
        assert!(!settings.is_usable());
        assert_eq!(settings.unusable_reason().as_deref(), Some("no API key"));
    }

    #[test]
    fn test_key_from_fallback_env_var() {
        let settings = FileProviderConfig::default()
            .resolve(ProviderId::Gemini, env_of(&[("GEMINI_API_KEY", "g-key")]));
        assert_eq!(settings.api_key.as_deref(), Some("g-key"));
        assert!(settings.is_usable());
    }

    #[test]
    fn test_first_env_var_wins() {
        let settings = FileProviderConfig::default().resolve(
            ProviderId::Claude,
            env_of(&[("ANTHROPIC_API_KEY", "first"), ("CLAUDE_API_KEY", "second")]),
        );
        assert_eq!(settings.api_key.as_deref(), Some("first"));
    }

    #[test]
    fn test_empty_env_var_falls_through() {
        let settings = FileProviderConfig::default().resolve(
            ProviderId::Claude,
            env_of(&[("ANTHROPIC_API_KEY", ""), ("CLAUDE_API_KEY", "sk-ant")]),
        );
        assert_eq!(settings.api_key.as_deref(), Some("sk-ant"));
        assert!(settings.is_usable());
    }

    #[test]
    fn test_azure_from_environment() {
        let settings = FileProviderConfig::default().resolve(
            ProviderId::OpenAi,
            env_of(&[
                ("AZURE_OPENAI_API_KEY", "az-key"),
                ("OPENAI_API_KEY", "oa-key"),
                ("AZURE_OPENAI_ENDPOINT", "https://tickets.openai.azure.com/"),
                ("AZURE_OPENAI_DEPLOYMENT_NAME", "gpt4o-prod"),
                ("AZURE_OPENAI_API_VERSION", "2024-06-01"),
            ]),
        );
        assert_eq!(settings.api_key.as_deref(), Some("az-key"));
        assert_eq!(
            settings.base_url,
            "https://tickets.openai.azure.com/openai/deployments/gpt4o-prod"
        );
        assert_eq!(
            settings.azure,
            Some(AzureSettings {
                deployment: "gpt4o-prod".into(),
                api_version: Some("2024-06-01".into()),
            })
        );
    }

    #[test]
    fn test_azure_deployment_defaults_to_model() {
        let config = FileProviderConfig {
            azure: FileAzureConfig {
                endpoint: Some("https://r.openai.azure.com".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let settings = config.resolve(ProviderId::OpenAi, env_of(&[]));
        assert_eq!(settings.base_url, "https://r.openai.azure.com/openai/deployments/gpt-4o");
        assert_eq!(settings.azure.and_then(|a| a.api_version), None);
    }

    #[test]
    fn test_explicit_base_url_ignores_azure_env() {
        let config = FileProviderConfig {
            base_url: Some("http://localhost:8080/v1".into()),
            ..Default::default()
        };
        let settings = config.resolve(
            ProviderId::OpenAi,
            env_of(&[("AZURE_OPENAI_ENDPOINT", "https://r.openai.azure.com")]),
        );
        assert_eq!(settings.base_url, "http://localhost:8080/v1");
        assert!(settings.azure.is_none());
    }

    #[test]
    fn test_azure_only_applies_to_openai() {
        let settings = FileProviderConfig::default().resolve(
            ProviderId::Gemini,
            env_of(&[("AZURE_OPENAI_ENDPOINT", "https://r.openai.azure.com")]),
        );
        assert!(settings.azure.is_none());
    }

    #[test]
    fn test_explicit_key_and_overrides() {
        let config = FileProviderConfig {
            api_key: Some("direct".into()),
            base_url: Some("http://localhost:8080/v1".into()),
            model: Some("local-model".into()),
            ..Default::default()
        };
        let settings = config.resolve(ProviderId::OpenAi, env_of(&[("OPENAI_API_KEY", "env")]));
        assert_eq!(settings.api_key.as_deref(), Some("direct"));
        assert_eq!(settings.base_url, "http://localhost:8080/v1");
        assert_eq!(settings.model, "local-model");
    }

    #[test]
    fn test_custom_env_list_replaces_defaults() {
        let config = FileProviderConfig {
            api_key_env: Some(vec!["AZURE_OPENAI_KEY".into()]),
            ..Default::default()
        };
        let settings = config.resolve(ProviderId::OpenAi, env_of(&[("OPENAI_API_KEY", "x")]));
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn test_disabled_with_key_is_unusable() {
        let config = FileProviderConfig {
            enabled: false,
            api_key: Some("k".into()),
            ..Default::default()
        };
        let settings = config.resolve(ProviderId::OpenAi, env_of(&[]));
        assert!(!settings.is_usable());
        assert_eq!(
            settings.unusable_reason().as_deref(),
            Some("disabled in configuration")
        );
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let settings = FileProviderConfig::default()
            .resolve(ProviderId::OpenAi, env_of(&[("OPENAI_API_KEY", "  ")]));
        assert!(settings.api_key.is_none());
    }
}
