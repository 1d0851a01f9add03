//! Loop and output-cap configuration (`[execution]` and `[limits]` sections)

use relay_application::ExecutionParams;
use relay_domain::{ClientProfile, SizeLimits};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutionConfig {
    /// Tool-round ceiling per conversation loop
    pub max_iterations: usize,
    /// Whole-run deadline per loop; unset means no deadline
    pub timeout_secs: Option<u64>,
    /// Check tool arguments against the declared schema before invoking
    pub validate_arguments: bool,
    /// Which output cap from `[limits]` applies
    pub client_profile: ClientProfile,
}

impl Default for FileExecutionConfig {
    fn default() -> Self {
        let params = ExecutionParams::default();
        Self {
            max_iterations: params.max_iterations,
            timeout_secs: None,
            validate_arguments: params.validate_arguments,
            client_profile: params.client_profile,
        }
    }
}

impl FileExecutionConfig {
    pub fn to_params(&self) -> ExecutionParams {
        ExecutionParams::default()
            .with_max_iterations(self.max_iterations)
            .with_timeout(self.timeout_secs.map(Duration::from_secs))
            .with_validate_arguments(self.validate_arguments)
            .with_client_profile(self.client_profile)
    }
}

/// Sanitized tool output caps, in bytes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLimitsConfig {
    pub constrained: usize,
    pub server: usize,
}

impl Default for FileLimitsConfig {
    fn default() -> Self {
        let limits = SizeLimits::default();
        Self {
            constrained: limits.constrained,
            server: limits.server,
        }
    }
}

impl FileLimitsConfig {
    pub fn to_limits(&self) -> SizeLimits {
        SizeLimits {
            constrained: self.constrained,
            server: self.server,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_application_defaults() {
        let params = FileExecutionConfig::default().to_params();
        assert_eq!(params.max_iterations, 5);
        assert!(params.timeout.is_none());
        assert!(params.validate_arguments);
        assert_eq!(params.client_profile, ClientProfile::Server);
        assert_eq!(FileLimitsConfig::default().to_limits(), SizeLimits::default());
    }

    #[test]
    fn test_partial_section() {
        let config: FileExecutionConfig = toml::from_str(
            r#"
timeout_secs = 90
client_profile = "constrained"
"#,
        )
        .unwrap();
        let params = config.to_params();
        assert_eq!(params.max_iterations, 5);
        assert_eq!(params.timeout, Some(Duration::from_secs(90)));
        assert_eq!(params.client_profile, ClientProfile::Constrained);
    }
}
