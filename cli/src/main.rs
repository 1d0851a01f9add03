//! CLI entrypoint for tool-relay
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use relay_application::{
    BuildCatalogUseCase, ConversationLogger, ExecutionParams, LoopProgressNotifier,
    MultiProviderRouter, NoProgress, RouteMode, SessionConfig, ToolContext, ToolExecutorPort,
};
use relay_domain::{OutputFormat, PromptTemplate, ProviderId};
use relay_infrastructure::{
    ConfigLoader, FileConfig, JsonlConversationLogger, McpToolBackend, ProviderFactory,
};
use relay_presentation::{
    Cli, Command, ConsoleFormatter, ProgressReporter, SimpleProgress, Target,
};
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(&cli, &config)?;

    if cli.show_config {
        print_config(&cli, &config)?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command.clone() else {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let format: OutputFormat = cli
        .output
        .map(Into::into)
        .or(config.output.format)
        .unwrap_or_default();
    if cli.no_color || !config.output.color {
        colored::control::set_override(false);
    }

    info!("Starting tool-relay");

    // === Dependency Injection ===
    let provider_settings = config.providers.resolve_all(|name| std::env::var(name).ok());
    let mut session = config.session_config(&provider_settings);
    session.execution = apply_overrides(session.execution, &cli);
    debug!("Execution parameters: {:?}", session.execution);

    let launch = config.backend.launch(|name| std::env::var(name).ok());
    let backend = McpToolBackend::spawn(&launch)
        .await
        .with_context(|| format!("Failed to start tool server '{}'", launch.program))?;
    let executor: Arc<dyn ToolExecutorPort> = backend;

    let catalog = Arc::new(
        BuildCatalogUseCase::new(Arc::clone(&executor))
            .execute()
            .await?,
    );
    let tools = Arc::new(ToolContext::new(Arc::clone(&catalog), executor));
    let adapters =
        ProviderFactory::build(&provider_settings).context("Failed to create provider adapters")?;

    let cancel = CancellationToken::new();
    let router = MultiProviderRouter::new(adapters, tools, &session)
        .with_cancellation(cancel.clone())
        .with_progress(progress_notifier(&cli))
        .with_conversation_logger(conversation_logger(&cli, &config));

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling running conversations");
            cancel.cancel();
        }
    });

    let default_provider = config.providers.default;
    let output = match command {
        Command::Ask { query, target } => {
            run_query(&router, &query, &target, default_provider, format).await?
        }
        Command::Analyze { query, target } => {
            let query = PromptTemplate::analyze_tickets(&query);
            run_query(&router, &query, &target, default_provider, format).await?
        }
        Command::Report { kind, target } => {
            let query = PromptTemplate::report(kind);
            run_query(&router, &query, &target, default_provider, format).await?
        }
        Command::Broadcast { query } => {
            let all = Target {
                provider: None,
                all: true,
            };
            run_query(&router, &query, &all, default_provider, format).await?
        }
        Command::Consensus { query } => {
            let report = router.consensus(&query).await?;
            let any_success = report.results.iter().any(|r| r.is_success());
            (ConsoleFormatter::consensus(format, &report), any_success)
        }
        Command::Status => (ConsoleFormatter::status(format, &router.status()), true),
        Command::Tools => (ConsoleFormatter::tools(format, &catalog), true),
    };

    let (text, any_success) = output;
    print!("{}", text);

    Ok(if any_success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Run one query; returns the rendered output and whether any provider answered.
async fn run_query(
    router: &MultiProviderRouter,
    query: &str,
    target: &Target,
    default_provider: Option<ProviderId>,
    format: OutputFormat,
) -> Result<(String, bool)> {
    let mode = if target.all {
        RouteMode::Broadcast
    } else if let Some(provider) = target.provider {
        RouteMode::Single(provider)
    } else {
        RouteMode::Auto {
            preferred: default_provider,
        }
    };

    let outcome = router.route(query, mode).await?;
    let results = outcome.results();
    Ok((
        ConsoleFormatter::results(format, results),
        results.iter().any(|r| r.is_success()),
    ))
}

/// CLI flags win over the configuration file.
fn apply_overrides(mut params: ExecutionParams, cli: &Cli) -> ExecutionParams {
    if let Some(max) = cli.max_iterations {
        params = params.with_max_iterations(max);
    }
    if let Some(secs) = cli.timeout {
        params = params.with_timeout(Some(Duration::from_secs(secs)));
    }
    if let Some(profile) = cli.profile {
        params = params.with_client_profile(profile.into());
    }
    if cli.no_validate {
        params = params.with_validate_arguments(false);
    }
    params
}

fn progress_notifier(cli: &Cli) -> Arc<dyn LoopProgressNotifier> {
    if cli.quiet {
        Arc::new(NoProgress)
    } else if std::io::stderr().is_terminal() {
        Arc::new(ProgressReporter::new())
    } else {
        Arc::new(SimpleProgress)
    }
}

fn conversation_logger(cli: &Cli, config: &FileConfig) -> Arc<dyn ConversationLogger> {
    let path = cli
        .transcript
        .as_ref()
        .or(config.logging.conversation_log.as_ref());

    match path.and_then(JsonlConversationLogger::new) {
        Some(logger) => {
            info!("Writing transcript to {}", logger.path().display());
            Arc::new(logger)
        }
        None => {
            if let Some(path) = path {
                warn!("Could not open transcript file {}", path.display());
            }
            Arc::new(relay_application::NoConversationLogger)
        }
    }
}

/// Console logging from `-v` / `RUST_LOG`, plus an optional log file.
fn init_tracing(cli: &Cli, config: &FileConfig) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let Some(path) = &config.logging.file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let file_name = path
        .file_name()
        .context("[logging] file must name a file")?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        dir, file_name,
    ));
    let file = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
    Ok(Some(guard))
}

fn print_config(cli: &Cli, config: &FileConfig) -> Result<()> {
    for line in ConfigLoader::describe_sources(cli.config.as_ref()) {
        println!("{}", line);
    }

    let mut redacted = config.clone();
    for id in ProviderId::all() {
        let provider = match id {
            ProviderId::OpenAi => &mut redacted.providers.openai,
            ProviderId::Claude => &mut redacted.providers.claude,
            ProviderId::Gemini => &mut redacted.providers.gemini,
        };
        if provider.api_key.is_some() {
            provider.api_key = Some("********".to_string());
        }
    }

    println!();
    println!(
        "{}",
        toml::to_string_pretty(&redacted).context("Failed to render configuration")?
    );

    let settings = config.providers.resolve_all(|name| std::env::var(name).ok());
    let session: SessionConfig = config.session_config(&settings);
    println!("Providers:");
    for entry in &settings {
        match entry.unusable_reason() {
            None => println!("  {:<7} enabled ({})", entry.id, entry.model),
            Some(reason) => println!("  {:<7} disabled: {}", entry.id, reason),
        }
    }
    println!("Tool output cap: {} bytes", session.size_limit());
    Ok(())
}
