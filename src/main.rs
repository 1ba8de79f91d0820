//! PagePilot - page automation with cross-context command coordination
//!
//! Main entry point for the PagePilot CLI.

mod bridge;
mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pagepilot_automation::cdp::{CdpClient, CdpPage};
use pagepilot_automation::{ActionExecutor, AutomationService};
use pagepilot_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};
use pagepilot_coordinator::{AggregateStore, AutomationLink, Coordinator, FileKvStore};

use cli::{Cli, Commands};

/// Get the .pagepilot directory path.
fn pagepilot_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".pagepilot"))
        .unwrap_or_else(|| PathBuf::from(".pagepilot"))
}

/// Initialize tracing with stderr and optional file output.
///
/// Stdout carries the protocol, so nothing is logged there.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let file_layer = match &logging.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("pagepilot")
                .filename_suffix("log")
                .max_log_files(logging.max_files)
                .build(dir)?;

            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            // Keep the writer alive for the program duration.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .with(file_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .unwrap_or_else(|| pagepilot_dir().join("config.toml"));
    let config = ConfigLoader::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    init_tracing(&config.logging)?;

    match cli.command {
        None => run(config).await,
        Some(Commands::Run { endpoint, target }) => {
            let mut config = config;
            if let Some(endpoint) = endpoint {
                config.automation.endpoint = endpoint;
            }
            if let Some(target) = target {
                config.automation.target_url = target;
            }
            run(config).await
        }
        Some(Commands::CheckConfig) => check_config(&config),
        Some(Commands::Snapshot { pretty }) => snapshot(&config, pretty).await,
    }
}

/// Attach to the page and serve UI envelopes until stdin closes.
async fn run(config: Config) -> anyhow::Result<()> {
    info!("Starting PagePilot v{}", env!("CARGO_PKG_VERSION"));

    let warnings = ConfigValidator::validate(&config).into_result()?;
    for warning in warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }

    // Automation context
    let client = Arc::new(
        CdpClient::connect(&config.automation.endpoint)
            .await
            .with_context(|| format!("connecting to Chrome at {}", config.automation.endpoint))?,
    );
    let page = CdpPage::attach(client, &config.automation.target_url)
        .await
        .with_context(|| format!("attaching to {}", config.automation.target_url))?;
    info!("Attached to {}", config.automation.target_url);

    // Coordinator
    let kv = Arc::new(FileKvStore::new(config.storage.path.clone()).await?);
    let store = AggregateStore::load(kv, config.limits.max_messages_per_chat).await?;
    info!("State loaded from {}", config.storage.path.display());

    let (link, endpoint) = AutomationLink::channel(&config.timeouts, config.limits.link_capacity);
    let coordinator = Arc::new(Coordinator::new(store, link, &config.limits));
    let shutdown = CancellationToken::new();

    let service = AutomationService::new(ActionExecutor::new(&config), Arc::new(page));
    let automation = tokio::spawn(service.serve(
        endpoint.actions,
        endpoint.outcomes,
        shutdown.clone(),
    ));

    let (command_tx, command_rx) = mpsc::channel(config.limits.link_capacity);
    let (reply_tx, reply_rx) = mpsc::channel(config.limits.link_capacity);
    let events = coordinator.subscribe();
    let serving = tokio::spawn(coordinator.clone().serve(
        command_rx,
        reply_tx.clone(),
        shutdown.clone(),
    ));
    let writer = tokio::spawn(bridge::write_output(tokio::io::stdout(), reply_rx, events));

    tokio::select! {
        result = bridge::read_commands(tokio::io::stdin(), command_tx, reply_tx) => {
            if let Err(e) = result {
                error!("Reading commands failed: {}", e);
            }
            // Let in-flight commands finish and flush their replies.
            let _ = serving.await;
            if let Err(e) = writer.await? {
                error!("Writing replies failed: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, shutting down");
        }
    }

    shutdown.cancel();
    let _ = automation.await;
    info!("PagePilot stopped");
    Ok(())
}

fn check_config(config: &Config) -> anyhow::Result<()> {
    let result = ConfigValidator::validate(config);
    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    if !result.is_valid() {
        anyhow::bail!("configuration has {} error(s)", result.errors.len());
    }
    println!("configuration OK");
    Ok(())
}

/// Print persisted state without starting a browser.
async fn snapshot(config: &Config, pretty: bool) -> anyhow::Result<()> {
    let kv = Arc::new(FileKvStore::new(config.storage.path.clone()).await?);
    let store = AggregateStore::load(kv, config.limits.max_messages_per_chat).await?;
    let snapshot = store.snapshot();

    let json = if pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{}", json);
    Ok(())
}
