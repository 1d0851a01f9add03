//! Infrastructure layer for tool-relay
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: HTTP model providers, the MCP tool backend,
//! configuration file loading and conversation transcripts.

pub mod config;
pub mod logging;
pub mod mcp;
pub mod providers;

// Re-export commonly used types
pub use config::{
    AzureSettings, BackendLaunch, ConfigError, ConfigLoader, FileAzureConfig, FileBackendConfig,
    FileConfig, FileExecutionConfig, FileLimitsConfig, FileLoggingConfig, FileOutputConfig,
    FileProviderConfig, FileProvidersConfig, ProviderSettings,
};
pub use logging::JsonlConversationLogger;
pub use mcp::{McpError, McpToolBackend};
pub use providers::{AnthropicProvider, GeminiProvider, OpenAiProvider, ProviderFactory};
