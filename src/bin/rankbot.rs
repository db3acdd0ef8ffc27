use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use allora_rank_bot::api::AlloraClient;
use allora_rank_bot::config::{AppConfig, CONFIG_PATH};
use allora_rank_bot::store::SnapshotStore;
use allora_rank_bot::telegram::{Command, HELP_TEXT, Telegram};
use allora_rank_bot::{engine, reporter};

#[derive(Parser)]
#[command(name = "rankbot", about = "Allora competition rank watcher")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Run a single pass, print the report to stdout and exit (no Telegram)
    #[arg(long)]
    once: bool,

    /// Override the configured poll interval, in seconds
    #[arg(long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = AppConfig::load(&args.config)?;
    info!("Loaded config from {}", args.config.display());
    if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
        config.telegram.token = token;
    }
    if config.allora.addresses.is_empty() {
        anyhow::bail!("No addresses configured under [allora].addresses");
    }

    let api = AlloraClient::new(&config.allora.forge_base, &config.allora.api)?;
    let store = SnapshotStore::new(&config.settings.history_dir)?;

    if args.once {
        let outcome = engine::run_pass(&api, &store, &config.allora.addresses).await;
        println!("{}", reporter::format_report(&outcome.reports));
        return Ok(());
    }

    let telegram = Telegram::new(&config.telegram.token, config.telegram.message_thread)?;
    let interval = args.interval.unwrap_or(config.settings.poll_interval_secs);
    let poll = Duration::from_secs(interval);
    info!(
        "Watching {} address(es), poll={interval}s. Press Ctrl+C to stop.",
        config.allora.addresses.len()
    );

    // Interval keeps its schedule across loop iterations, unlike a fresh
    // sleep, which would never fire while command long-polls keep completing
    // first. The first tick is immediate and seeds history at startup.
    let mut ticker = tokio::time::interval(poll);
    let mut offset: i64 = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                info!("Running periodic rank check...");
                let outcome = engine::run_pass(&api, &store, &config.allora.addresses).await;
                if outcome.reports.is_empty() {
                    warn!("Pass produced no reports");
                } else if outcome.notification_worthy() {
                    info!("Rank changes detected, delivering report");
                    let text = reporter::format_report(&outcome.reports);
                    if let Err(e) = telegram.send(config.telegram.chat_id, &text).await {
                        warn!("Failed to deliver report: {e:#}");
                    }
                } else {
                    info!("No rank changes");
                }
            }
            commands = telegram.next_commands(&mut offset) => {
                match commands {
                    Ok(commands) => {
                        for command in commands {
                            handle_command(&api, &store, &telegram, &config, command).await;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to poll Telegram updates: {e:#}");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Handle a chat command. `/rank` always answers, whether or not anything
/// moved; command replies go to the chat that asked.
async fn handle_command(
    api: &AlloraClient,
    store: &SnapshotStore,
    telegram: &Telegram,
    config: &AppConfig,
    command: Command,
) {
    match command {
        Command::Rank { chat_id } => {
            info!("Handling /rank from chat {chat_id}");
            let outcome = engine::run_pass(api, store, &config.allora.addresses).await;
            let text = reporter::format_report(&outcome.reports);
            if let Err(e) = telegram.send(chat_id, &text).await {
                warn!("Failed to answer /rank: {e:#}");
            }
        }
        Command::Help { chat_id } => {
            if let Err(e) = telegram.send(chat_id, HELP_TEXT).await {
                warn!("Failed to answer /help: {e:#}");
            }
        }
    }
}
