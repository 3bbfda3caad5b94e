use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::TimeDelta;

use events::EngineConfig;
use monitor::{DEFAULT_MAX_AGE_SECS, MonitorConfig};

use crate::cli::Cli;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Bound on events waiting for dispatch.
    ///
    /// Acts as backpressure: once full, new events are rejected and logged
    /// rather than buffered without limit.
    pub queue_capacity: usize,

    /// History kept per instrument. Must cover at least one session so the
    /// limit-fall monitor can see the morning's touch.
    pub window_max_age: TimeDelta,

    /// Optional JSON file overriding the built-in thresholds.
    pub monitor_config_path: Option<PathBuf>,

    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let queue_capacity = env_parse("EVENT_QUEUE_CAPACITY")
            .unwrap_or(events::engine::DEFAULT_QUEUE_CAPACITY);
        let window_secs = env_parse("WINDOW_MAX_AGE_SECS").unwrap_or(DEFAULT_MAX_AGE_SECS);

        Ok(Self {
            queue_capacity,
            window_max_age: window_age(window_secs).context("WINDOW_MAX_AGE_SECS")?,
            monitor_config_path: std::env::var("MONITOR_CONFIG").ok().map(PathBuf::from),
            json_logs: std::env::var("APP_ENV").unwrap_or_default() == "production",
        })
    }

    /// Command-line flags win over the environment.
    pub fn with_cli(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(cap) = cli.queue_capacity {
            self.queue_capacity = cap;
        }
        if let Some(secs) = cli.window_secs {
            self.window_max_age = window_age(secs).context("--window-secs")?;
        }
        if cli.monitor_config.is_some() {
            self.monitor_config_path = cli.monitor_config.clone();
        }
        self.json_logs |= cli.json_logs;
        Ok(self)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            queue_capacity: self.queue_capacity,
        }
    }

    pub fn load_monitor_config(&self) -> anyhow::Result<MonitorConfig> {
        let Some(path) = &self.monitor_config_path else {
            return Ok(MonitorConfig::default());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading monitor config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing monitor config {}", path.display()))
    }
}

/// Window age in whole seconds; must be positive and representable.
fn window_age(secs: i64) -> anyhow::Result<TimeDelta> {
    if secs <= 0 {
        bail!("window age must be positive, got {secs}s");
    }
    TimeDelta::try_seconds(secs).with_context(|| format!("window age {secs}s out of range"))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
