//! Application-level configuration.
//!
//! - [`ExecutionParams`]: conversation loop control (ceiling, timeout, validation)
//! - [`SessionConfig`]: provider enablement and output caps, frozen at startup

pub mod execution_params;
pub mod session_config;

pub use execution_params::ExecutionParams;
pub use session_config::SessionConfig;
