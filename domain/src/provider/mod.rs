//! Provider identity and per-provider run results.

pub mod result;

pub use result::{FailureKind, ProviderFailure, ProviderResult, Termination};

use crate::tool::dialect::Dialect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Claude,
    Gemini,
}

impl ProviderId {
    pub fn all() -> [ProviderId; 3] {
        [ProviderId::OpenAi, ProviderId::Claude, ProviderId::Gemini]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Claude => "claude",
            ProviderId::Gemini => "gemini",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "OpenAI",
            ProviderId::Claude => "Claude",
            ProviderId::Gemini => "Gemini",
        }
    }

    /// The tool-schema dialect this provider speaks.
    pub fn dialect(&self) -> Dialect {
        match self {
            ProviderId::OpenAi => Dialect::OpenAi,
            ProviderId::Claude => Dialect::Claude,
            ProviderId::Gemini => Dialect::Gemini,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" | "gpt" | "azure" => Ok(ProviderId::OpenAi),
            "claude" | "anthropic" => Ok(ProviderId::Claude),
            "gemini" | "google" => Ok(ProviderId::Gemini),
            other => Err(format!(
                "Unknown provider '{}'. Expected one of: openai, claude, gemini",
                other
            )),
        }
    }
}
