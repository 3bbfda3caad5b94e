pub mod cli;
pub mod config;
pub mod notify;
pub mod replay;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use common::init_tracing;
use events::{Event, EventEngine, EventHandler};
use monitor::{MonitorManager, SignalLabel};

use cli::Cli;
use config::AppConfig;
use notify::LogNotifier;
use replay::Replayer;

/// Subscriber that writes every signal event to the log.
fn log_subscriber() -> EventHandler {
    Arc::new(|ev: &Event| -> anyhow::Result<()> {
        info!(target: "signals", event_type = %ev.event_type, payload = %ev.payload, "signal event");
        Ok(())
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::from_env()?.with_cli(&cli)?;

    init_tracing("tickwatch", cfg.json_logs);

    let monitor_config = cfg.load_monitor_config()?;
    info!(?monitor_config, "monitor configuration loaded");

    let engine = Arc::new(EventEngine::new(cfg.engine_config()));
    let subscriber = log_subscriber();
    for label in SignalLabel::ALL {
        engine.register(&label.as_event_type(), subscriber.clone());
    }
    engine.start()?;

    let mut replayer = Replayer::new(
        MonitorManager::new(monitor_config),
        cfg.window_max_age,
        Arc::clone(&engine),
        Arc::new(LogNotifier),
    );

    let summary = if cli.input == Path::new("-") {
        replayer.run(io::stdin().lock()).await
    } else {
        let file = File::open(&cli.input)
            .with_context(|| format!("opening {}", cli.input.display()))?;
        replayer.run(BufReader::new(file)).await
    };

    // Deliver whatever is still queued even if the replay failed midway.
    engine.stop().await?;

    let summary = summary?;
    info!(
        ticks = summary.ticks,
        malformed = summary.malformed,
        signals = summary.signals,
        stats = ?engine.stats(),
        "replay finished"
    );

    Ok(())
}
