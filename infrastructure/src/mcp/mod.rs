//! MCP (Model Context Protocol) tool backend
//!
//! Speaks newline-delimited JSON-RPC 2.0 to a tool server launched as a child
//! process and exposes it through the
//! [`ToolExecutorPort`](relay_application::ToolExecutorPort).

pub mod client;
pub mod error;
pub mod protocol;

pub use client::McpToolBackend;
pub use error::McpError;
