//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use relay_domain::{ClientProfile, OutputFormat, ProviderId, ReportKind};
use std::path::PathBuf;

/// Output format flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputArg {
    /// Headers, per-provider sections and usage
    Text,
    /// Final answers only
    Plain,
    /// JSON output
    Json,
}

impl From<OutputArg> for OutputFormat {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Text => OutputFormat::Text,
            OutputArg::Plain => OutputFormat::Plain,
            OutputArg::Json => OutputFormat::Json,
        }
    }
}

/// Client profile flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileArg {
    /// Tight tool-output cap for desktop clients
    Constrained,
    /// Generous cap for server-side callers
    Server,
}

impl From<ProfileArg> for ClientProfile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Constrained => ClientProfile::Constrained,
            ProfileArg::Server => ClientProfile::Server,
        }
    }
}

/// CLI arguments for tool-relay
#[derive(Parser, Debug)]
#[command(name = "tool-relay")]
#[command(author, version, about = "Let LLM providers answer questions by calling your tools")]
#[command(long_about = r#"
tool-relay connects OpenAI, Claude and Gemini to a single MCP tool server.
Each provider runs its own conversation, calling tools until it can answer.

Configuration files are loaded from (in priority order):
1. TOOL_RELAY_* environment variables
2. --config <path>     Explicit config file
3. ./tool-relay.toml   Project-level config
4. ~/.config/tool-relay/config.toml   Global config

Example:
  tool-relay ask "How many tickets were opened in the last 3 days?"
  tool-relay ask --provider gemini "Which group has the most open tickets?"
  tool-relay broadcast "Summarize this week's urgent tickets"
  tool-relay report --kind monthly
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputArg>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Show configuration file locations and the merged configuration, then exit
    #[arg(long)]
    pub show_config: bool,

    /// Maximum tool rounds per provider
    #[arg(long, value_name = "N", global = true)]
    pub max_iterations: Option<usize>,

    /// Wall-clock budget per provider run, in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Tool-output size profile
    #[arg(long, value_enum, global = true)]
    pub profile: Option<ProfileArg>,

    /// Skip argument validation before tool calls
    #[arg(long, global = true)]
    pub no_validate: bool,

    /// Append a JSONL transcript of every run to this file
    #[arg(long, value_name = "PATH", global = true)]
    pub transcript: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask one provider (the configured default, or the first available)
    Ask {
        /// The question
        query: String,
        #[command(flatten)]
        target: Target,
    },
    /// Ask every enabled provider concurrently
    Broadcast {
        /// The question
        query: String,
    },
    /// Ask every enabled provider and compare their answers
    Consensus {
        /// The question
        query: String,
    },
    /// Ticket analysis: the question plus an instruction to use the tools
    Analyze {
        /// What to analyze
        query: String,
        #[command(flatten)]
        target: Target,
    },
    /// Generate a ticket report
    Report {
        /// weekly, monthly or summary
        #[arg(short, long, default_value = "weekly")]
        kind: ReportKind,
        #[command(flatten)]
        target: Target,
    },
    /// List the tools the backend offers
    Tools,
    /// Show provider availability and the tool catalog size
    Status,
}

/// Which providers a single-query command goes to
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    /// Provider to use (openai, claude, gemini)
    #[arg(short, long, value_name = "PROVIDER")]
    pub provider: Option<ProviderId>,

    /// Send to every enabled provider instead
    #[arg(long, conflicts_with = "provider")]
    pub all: bool,
}

impl Cli {
    /// Log level implied by the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_with_provider() {
        let cli =
            Cli::try_parse_from(["tool-relay", "ask", "-p", "gemini", "how many tickets?"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Ask {
                query: "how many tickets?".into(),
                target: Target {
                    provider: Some(ProviderId::Gemini),
                    all: false,
                },
            })
        );
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(Cli::try_parse_from(["tool-relay", "ask", "-p", "bard", "q"]).is_err());
    }

    #[test]
    fn test_provider_and_all_conflict() {
        let parsed = Cli::try_parse_from(["tool-relay", "analyze", "--all", "-p", "claude", "q"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_report_defaults_to_weekly() {
        let cli = Cli::try_parse_from(["tool-relay", "report"]).unwrap();
        match cli.command {
            Some(Command::Report { kind, .. }) => assert_eq!(kind, ReportKind::Weekly),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tool-relay",
            "broadcast",
            "q",
            "--output",
            "json",
            "--max-iterations",
            "3",
            "--profile",
            "constrained",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.output, Some(OutputArg::Json));
        assert_eq!(cli.max_iterations, Some(3));
        assert_eq!(cli.profile.map(ClientProfile::from), Some(ClientProfile::Constrained));
        assert_eq!(cli.log_level(), "debug");
    }

    #[test]
    fn test_show_config_needs_no_command() {
        let cli = Cli::try_parse_from(["tool-relay", "--show-config"]).unwrap();
        assert!(cli.show_config);
        assert!(cli.command.is_none());
    }
}
