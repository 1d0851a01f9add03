//! Progress notification port
//!
//! Defines the interface for reporting conversation loop progress.

use relay_domain::{ProviderId, ProviderResult};

/// Callback for progress updates during conversation loops
///
/// Implementations live in the presentation layer. During a broadcast the
/// same notifier is called from several concurrent loops, so implementations
/// must key their state by provider.
pub trait LoopProgressNotifier: Send + Sync {
    /// Called when a provider's loop starts
    fn on_loop_start(&self, provider: ProviderId);

    /// Called when a provider's loop finishes, successfully or not
    fn on_loop_complete(&self, provider: ProviderId, result: &ProviderResult);

    /// Called before each provider round-trip; `round` counts tool rounds so far
    fn on_model_request(&self, _provider: ProviderId, _round: usize) {}

    /// Called before a tool call is issued
    fn on_tool_start(&self, _provider: ProviderId, _tool_name: &str) {}

    /// Called after a tool call resolves
    fn on_tool_complete(&self, _provider: ProviderId, _tool_name: &str, _is_error: bool) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl LoopProgressNotifier for NoProgress {
    fn on_loop_start(&self, _provider: ProviderId) {}
    fn on_loop_complete(&self, _provider: ProviderId, _result: &ProviderResult) {}
}
