//! Error types for the MCP tool backend

use relay_application::ToolExecutorError;
use thiserror::Error;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, McpError>;

/// Errors that can occur when talking to the MCP server process
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Failed to spawn tool server '{program}': {source}")]
    SpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("JSON-RPC error (code {code}): {message}")]
    RpcError { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Transport closed")]
    TransportClosed,

    #[error("Request '{method}' timed out after {secs}s")]
    Timeout { method: String, secs: u64 },
}

impl From<McpError> for ToolExecutorError {
    fn from(err: McpError) -> Self {
        match err {
            McpError::RpcError { code, message } => ToolExecutorError::Rpc { code, message },
            McpError::Timeout { secs, .. } => ToolExecutorError::Timeout(secs),
            McpError::SerializationError(e) => ToolExecutorError::Protocol(e.to_string()),
            McpError::UnexpectedResponse(msg) => ToolExecutorError::Protocol(msg),
            other @ (McpError::SpawnError { .. } | McpError::Io(_) | McpError::TransportClosed) => {
                ToolExecutorError::Unavailable(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_maps_to_executor_timeout() {
        let err: ToolExecutorError = McpError::Timeout {
            method: "tools/call".into(),
            secs: 60,
        }
        .into();
        assert!(matches!(err, ToolExecutorError::Timeout(60)));
    }

    #[test]
    fn test_closed_transport_is_unavailable() {
        let err: ToolExecutorError = McpError::TransportClosed.into();
        assert_eq!(err.to_string(), "Tool backend unavailable: Transport closed");
    }
}
