//! GridBot - Main Entry Point
//!
//! Loads the configuration, starts one grid run on Bybit and stops it
//! on Ctrl-C or when the run finishes on its own.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use grid_bot::config::load_config;
use grid_bot::{
    BybitRestClient, EngineSettings, ExchangeClient, GridBot, LogNotifier, Notifier,
    WebhookNotifier,
};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "GRIDBOT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    let app = load_config(Some(&args.config))
        .with_context(|| format!("loading configuration from {}", args.config))?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| app.settings.log_level.clone());
    init_tracing(&level, args.json_logs)?;

    info!("Starting GridBot");
    info!("Configuration file: {}", args.config);

    let mut client =
        BybitRestClient::with_timeout(&app.exchange.rest_url, app.settings.request_timeout())?
            .with_recv_window(app.exchange.recv_window_ms);
    match app.exchange.credentials() {
        Some(credentials) => client = client.with_credentials(credentials),
        None => warn!("No API credentials configured; private endpoints will fail"),
    }
    let exchange: Arc<dyn ExchangeClient> = Arc::new(client);

    let notifier: Arc<dyn Notifier> = match &app.notifier.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::with_timeout(url, app.settings.request_timeout())?),
        None => Arc::new(LogNotifier),
    };

    let bot = GridBot::new(exchange, notifier, EngineSettings::from(&app.settings));
    bot.start(app.bot.clone())?;

    let mut poll = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Received shutdown signal, cleaning up...");
                bot.stop().await;
                break;
            }
            _ = poll.tick() => {
                if !bot.is_running() {
                    info!("Run finished");
                    break;
                }
            }
        }
    }

    Ok(())
}
