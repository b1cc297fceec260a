#![forbid(unsafe_code)]

//! `pager-relay` — Slack escalation bot binary.
//!
//! Bootstraps configuration, resolves the channel allow-list, and runs
//! the Slack Socket Mode listener until the process is terminated.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use pager_relay::config::{self, Config};
use pager_relay::slack::channels::AllowedChannels;
use pager_relay::slack::client::{BotState, SlackService};
use pager_relay::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "pager-relay", about = "Slack to PagerDuty escalation bot", version, long_about = None)]
struct Cli {
    /// Directory holding mounted secret files.
    #[arg(long, default_value = config::DEFAULT_SECRETS_DIR)]
    secrets_dir: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format, config::debug_flag())?;
    info!("pager-relay bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(&args))
}

async fn run(args: &Cli) -> Result<()> {
    let config = match Config::load_from(&args.secrets_dir) {
        Ok(config) => Arc::new(config),
        Err(err) => {
            error!(%err, "error starting bot");
            return Err(err);
        }
    };
    info!("configuration loaded");

    let slack = Arc::new(SlackService::new(&config.slack_bot_token)?);

    let allowed = AllowedChannels::resolve(&config.allowed_channels, slack.as_ref()).await;
    if !allowed.is_empty() {
        info!(count = allowed.len(), "channel allow-list active");
    }

    let state = Arc::new(BotState::new(
        Arc::clone(&config),
        allowed,
        Arc::clone(&slack),
    )?);

    info!("starting Slack bot in Socket Mode");
    let socket_task = slack.start_socket_mode(&config.slack_app_token, state);

    shutdown_signal().await;
    info!("shutdown signal received");
    socket_task.abort();
    info!("pager-relay shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat, debug: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
