//! Model provider adapters
//!
//! One [`ModelProvider`] per supported API, all over `reqwest`:
//!
//! - [`OpenAiProvider`]: OpenAI-compatible chat completions
//! - [`AnthropicProvider`]: Anthropic Messages
//! - [`GeminiProvider`]: Gemini `generateContent`
//!
//! Each adapter keeps request building and response parsing in pure
//! functions so the wire formats are testable without a network.

pub mod anthropic;
pub mod gemini;
mod http;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use crate::config::ProviderSettings;
use relay_application::{ModelProvider, ProviderError};
use relay_domain::ProviderId;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds adapters for every usable provider.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Adapters for the usable entries of `settings`, in input order.
    ///
    /// Unusable providers are skipped silently; the router reports them as
    /// disabled.
    pub fn build(
        settings: &[ProviderSettings],
    ) -> Result<Vec<Arc<dyn ModelProvider>>, ProviderError> {
        let mut providers: Vec<Arc<dyn ModelProvider>> = Vec::new();

        for entry in settings {
            if let Some(reason) = entry.unusable_reason() {
                debug!("Skipping provider {}: {}", entry.id, reason);
                continue;
            }
            providers.push(Self::create(entry.clone())?);
            info!("Provider {} ready (model: {})", entry.id, entry.model);
        }

        Ok(providers)
    }

    pub fn create(settings: ProviderSettings) -> Result<Arc<dyn ModelProvider>, ProviderError> {
        Ok(match settings.id {
            ProviderId::OpenAi => Arc::new(OpenAiProvider::new(settings)?),
            ProviderId::Claude => Arc::new(AnthropicProvider::new(settings)?),
            ProviderId::Gemini => Arc::new(GeminiProvider::new(settings)?),
        })
    }
}

/// Check that `settings` belong to `expected` and carry a key.
fn settings_for(
    settings: ProviderSettings,
    expected: ProviderId,
) -> Result<ProviderSettings, ProviderError> {
    if settings.id != expected {
        return Err(ProviderError::Other(format!(
            "Settings for {} passed to the {} adapter",
            settings.id, expected
        )));
    }
    if !settings.is_usable() {
        return Err(ProviderError::Other(format!(
            "{} is not usable: {}",
            expected.display_name(),
            settings.unusable_reason().unwrap_or_default()
        )));
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileProvidersConfig;

    fn resolved(pairs: &[(&str, &str)]) -> Vec<ProviderSettings> {
        let env: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        FileProvidersConfig::default().resolve_all(move |name| {
            env.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
        })
    }

    #[test]
    fn test_build_skips_providers_without_keys() {
        let providers =
            ProviderFactory::build(&resolved(&[("ANTHROPIC_API_KEY", "sk-ant")])).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].id(), ProviderId::Claude);
        assert_eq!(providers[0].model(), "claude-3-5-sonnet-20241022");
    }

    #[test]
    fn test_build_keeps_order() {
        let providers = ProviderFactory::build(&resolved(&[
            ("GEMINI_API_KEY", "g"),
            ("OPENAI_API_KEY", "o"),
        ]))
        .unwrap();
        let ids: Vec<ProviderId> = providers.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![ProviderId::OpenAi, ProviderId::Gemini]);
    }

    #[test]
    fn test_adapter_rejects_foreign_settings() {
        let mut settings = resolved(&[("OPENAI_API_KEY", "o")]).remove(0);
        settings.id = ProviderId::Gemini;
        assert!(OpenAiProvider::new(settings).is_err());
    }

    #[test]
    fn test_adapter_rejects_missing_key() {
        let settings = resolved(&[]).remove(0);
        let err = OpenAiProvider::new(settings).err().unwrap();
        assert_eq!(err.to_string(), "Other error: OpenAI is not usable: no API key");
    }
}
