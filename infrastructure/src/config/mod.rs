//! Configuration file loading for tool-relay
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment: `TOOL_RELAY_*` (nested keys separated by `__`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./tool-relay.toml` or `./.tool-relay.toml`
//! 4. Global: `~/.config/tool-relay/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    AzureSettings, BackendLaunch, FileAzureConfig, FileBackendConfig, FileConfig,
    FileExecutionConfig, FileLimitsConfig, FileLoggingConfig, FileOutputConfig,
    FileProviderConfig, FileProvidersConfig, ProviderSettings,
};
pub use loader::{ConfigLoader, ENV_PREFIX};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
