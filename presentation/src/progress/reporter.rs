//! Progress reporting for conversation loops

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use relay_application::LoopProgressNotifier;
use relay_domain::{ProviderId, ProviderResult, Termination};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// One spinner per provider, redrawn as the loop moves between model and tools
pub struct ProgressReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<ProviderId, ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn with_bar(&self, provider: ProviderId, f: impl FnOnce(&ProgressBar)) {
        let bars = self.bars.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = bars.get(&provider) {
            f(pb);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopProgressNotifier for ProgressReporter {
    fn on_loop_start(&self, provider: ProviderId) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::spinner_style());
        pb.set_prefix(format!("{:<7}", provider.display_name()));
        pb.set_message("starting...");
        pb.enable_steady_tick(Duration::from_millis(100));

        self.bars
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(provider, pb);
    }

    fn on_model_request(&self, provider: ProviderId, round: usize) {
        self.with_bar(provider, |pb| {
            if round == 0 {
                pb.set_message("waiting for model");
            } else {
                pb.set_message(format!("waiting for model (after {} tool rounds)", round));
            }
        });
    }

    fn on_tool_start(&self, provider: ProviderId, tool_name: &str) {
        self.with_bar(provider, |pb| {
            pb.set_message(format!("calling {}", tool_name.yellow()));
        });
    }

    fn on_tool_complete(&self, provider: ProviderId, tool_name: &str, is_error: bool) {
        if is_error {
            self.with_bar(provider, |pb| {
                pb.set_message(format!("{} {} failed", "!".red(), tool_name));
            });
        }
    }

    fn on_loop_complete(&self, provider: ProviderId, result: &ProviderResult) {
        let pb = self
            .bars
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&provider);
        if let Some(pb) = pb {
            pb.finish_with_message(summary(result));
        }
    }
}

fn summary(result: &ProviderResult) -> String {
    match result.termination {
        Termination::Completed => format!(
            "{} done ({} tool rounds)",
            "v".green(),
            result.iteration_count
        ),
        Termination::IterationLimitExceeded => {
            format!("{} stopped at tool-round limit", "~".yellow())
        }
        Termination::Cancelled => format!("{} cancelled", "~".yellow()),
        Termination::Failed => format!(
            "{} {}",
            "x".red(),
            result
                .error
                .as_ref()
                .map(|e| e.message.as_str())
                .unwrap_or("failed")
        ),
    }
}

/// Line-based progress for non-interactive terminals
pub struct SimpleProgress;

impl LoopProgressNotifier for SimpleProgress {
    fn on_loop_start(&self, provider: ProviderId) {
        eprintln!("{} {}", "->".cyan(), provider.display_name().bold());
    }

    fn on_tool_start(&self, provider: ProviderId, tool_name: &str) {
        eprintln!("  [{}] calling {}", provider, tool_name);
    }

    fn on_loop_complete(&self, provider: ProviderId, result: &ProviderResult) {
        eprintln!("  [{}] {}", provider, summary(result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::{FailureKind, UsageMetrics};

    #[test]
    fn test_summary_per_termination() {
        colored::control::set_override(false);
        let done = ProviderResult::completed(ProviderId::Claude, "ok", UsageMetrics::default(), 2);
        assert_eq!(summary(&done), "v done (2 tool rounds)");

        let failed = ProviderResult::failed(ProviderId::Gemini, FailureKind::Crashed, "boom");
        assert_eq!(summary(&failed), "x boom");
    }

    #[test]
    fn test_reporter_tracks_bars_per_provider() {
        let reporter = ProgressReporter::new();
        reporter.on_loop_start(ProviderId::Claude);
        reporter.on_loop_start(ProviderId::Gemini);
        reporter.on_tool_start(ProviderId::Claude, "get_count");
        assert_eq!(reporter.bars.lock().unwrap().len(), 2);

        let done = ProviderResult::completed(ProviderId::Claude, "ok", UsageMetrics::default(), 1);
        reporter.on_loop_complete(ProviderId::Claude, &done);
        let bars = reporter.bars.lock().unwrap();
        assert!(!bars.contains_key(&ProviderId::Claude));
        assert!(bars.contains_key(&ProviderId::Gemini));
    }
}
