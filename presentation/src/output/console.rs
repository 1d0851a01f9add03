//! Console output formatter for provider results

use colored::Colorize;
use relay_application::{ConsensusReport, RouterStatus};
use relay_domain::{OutputFormat, ProviderResult, Termination, ToolCatalog};
use serde::Serialize;

/// Formats run results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Render results in `format`.
    pub fn results(format: OutputFormat, results: &[ProviderResult]) -> String {
        match format {
            OutputFormat::Text => Self::format_results(results),
            OutputFormat::Plain => Self::format_plain(results),
            OutputFormat::Json => Self::format_json(&results),
        }
    }

    pub fn consensus(format: OutputFormat, report: &ConsensusReport) -> String {
        match format {
            OutputFormat::Text => Self::format_consensus(report),
            OutputFormat::Plain => format!("{}\n", report.summary.conclusion),
            OutputFormat::Json => Self::format_json(report),
        }
    }

    pub fn status(format: OutputFormat, status: &RouterStatus) -> String {
        match format {
            OutputFormat::Json => Self::format_json(status),
            _ => Self::format_status(status),
        }
    }

    pub fn tools(format: OutputFormat, catalog: &ToolCatalog) -> String {
        match format {
            OutputFormat::Json => Self::format_json(&catalog.iter().collect::<Vec<_>>()),
            OutputFormat::Plain => catalog
                .names()
                .iter()
                .map(|name| format!("{}\n", name))
                .collect(),
            OutputFormat::Text => Self::format_tools(catalog),
        }
    }

    /// Full report: one section per provider plus a success tally
    pub fn format_results(results: &[ProviderResult]) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Tool Relay Results"));
        output.push('\n');

        for result in results {
            output.push_str(&Self::format_result(result));
        }

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let tally = format!("{}/{} providers answered", succeeded, results.len());
        output.push_str(&format!(
            "\n{}\n",
            if succeeded == results.len() {
                tally.green()
            } else {
                tally.yellow()
            }
        ));
        output.push_str(&Self::footer());

        output
    }

    /// One provider's section
    pub fn format_result(result: &ProviderResult) -> String {
        let title = match &result.model {
            Some(model) => format!("── {} ({}) ──", result.provider.display_name(), model),
            None => format!("── {} ──", result.provider.display_name()),
        };
        let title = if result.termination == Termination::Failed {
            title.red().bold()
        } else {
            title.yellow().bold()
        };

        let mut output = format!("\n{}\n", title);

        match (&result.error, &result.final_text) {
            (Some(error), _) => {
                output.push_str(&format!("{} {}\n", "Error:".red().bold(), error.message));
            }
            (None, Some(text)) => {
                output.push_str(text);
                output.push('\n');
            }
            (None, None) => {}
        }

        match result.termination {
            Termination::IterationLimitExceeded => output.push_str(&format!(
                "{}\n",
                "Stopped at the tool-round limit; answer may be incomplete.".yellow()
            )),
            Termination::Cancelled => output.push_str(&format!(
                "{}\n",
                "Cancelled; answer may be incomplete.".yellow()
            )),
            Termination::Completed | Termination::Failed => {}
        }

        if result.termination != Termination::Failed {
            output.push_str(&format!(
                "{}\n",
                format!(
                    "{} tool round(s), {} in / {} out tokens",
                    result.iteration_count, result.usage.input_tokens, result.usage.output_tokens
                )
                .dimmed()
            ));
        }

        output
    }

    /// Final answers only
    pub fn format_plain(results: &[ProviderResult]) -> String {
        let label = results.len() > 1;
        let mut output = String::new();

        for result in results {
            let body = match &result.error {
                Some(error) => format!("Error: {}", error.message),
                None => result.text().to_string(),
            };
            if label {
                output.push_str(&format!("[{}] ", result.provider));
            }
            output.push_str(&body);
            output.push('\n');
        }

        output
    }

    pub fn format_consensus(report: &ConsensusReport) -> String {
        let mut output = Self::format_results(&report.results);

        output.push_str(&Self::section_header("Consensus"));
        output.push_str(&format!(
            "{} {}\n",
            "Confidence:".cyan().bold(),
            report.summary.confidence
        ));
        if !report.summary.common_keywords.is_empty() {
            output.push_str(&format!(
                "{} {}\n",
                "Common keywords:".cyan().bold(),
                report.summary.common_keywords.join(", ")
            ));
        }
        output.push_str(&format!("\n{}\n", report.summary.conclusion));

        output
    }

    pub fn format_status(status: &RouterStatus) -> String {
        let mut output = String::new();

        output.push_str(&Self::section_header("Providers"));
        for provider in &status.providers {
            if provider.enabled {
                output.push_str(&format!(
                    "  {} {:<8} {}\n",
                    "v".green(),
                    provider.provider.display_name(),
                    provider.model.as_deref().unwrap_or("").dimmed()
                ));
            } else {
                output.push_str(&format!(
                    "  {} {:<8} {}\n",
                    "x".red(),
                    provider.provider.display_name(),
                    provider.reason.as_deref().unwrap_or("disabled").dimmed()
                ));
            }
        }

        output.push_str(&Self::section_header("Tools"));
        output.push_str(&format!("  {} tools available\n", status.tool_count));
        output.push_str(&format!(
            "  max {} tool rounds, {} byte result cap\n",
            status.max_iterations, status.size_limit
        ));

        output
    }

    pub fn format_tools(catalog: &ToolCatalog) -> String {
        let mut output = Self::section_header(&format!("Tools ({})", catalog.len()));

        for tool in catalog.iter() {
            output.push_str(&format!("  {}\n", tool.name.bold()));
            if !tool.description.is_empty() {
                output.push_str(&Self::indent(&tool.description, "      "));
                output.push('\n');
            }
            let required = tool.required_parameters();
            if !required.is_empty() {
                output.push_str(&format!(
                    "      {} {}\n",
                    "required:".dimmed(),
                    required.join(", ")
                ));
            }
        }

        output
    }

    /// Pretty JSON, or an error object if serialization fails
    pub fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
        match serde_json::to_string_pretty(value) {
            Ok(json) => format!("{}\n", json),
            Err(e) => format!("{{\"error\": \"Failed to serialize output: {}\"}}\n", e),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
