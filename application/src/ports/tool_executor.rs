//! Tool Executor port
//!
//! The backend that owns the actual tools. The orchestrator enumerates it once
//! per session and invokes tools by name; it never retries on its own.

use async_trait::async_trait;
use relay_domain::{RawToolOutput, ToolDescriptor};
use serde_json::Value;
use thiserror::Error;

/// Errors raised by a tool backend
#[derive(Error, Debug)]
pub enum ToolExecutorError {
    #[error("Tool backend unavailable: {0}")]
    Unavailable(String),

    #[error("Backend error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Tool call timed out after {0}s")]
    Timeout(u64),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Port for the tool backend
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Enumerate every tool the backend offers
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolExecutorError>;

    /// Invoke a tool by name
    ///
    /// A tool that ran but failed is `Ok` with `is_error: true`; `Err` means
    /// the call could not be completed at all.
    async fn invoke(&self, name: &str, arguments: &Value)
    -> Result<RawToolOutput, ToolExecutorError>;
}
