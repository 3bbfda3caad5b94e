use std::path::PathBuf;

use clap::Parser;

/// Replay indicator ticks through the pattern monitors.
#[derive(Debug, Parser)]
#[clap(name = "tickwatch", version)]
pub struct Cli {
    /// JSON-lines tick file, or `-` for stdin
    #[clap(default_value = "-")]
    pub input: PathBuf,

    /// JSON file overriding the default monitor thresholds
    #[clap(long)]
    pub monitor_config: Option<PathBuf>,

    /// Capacity of the event queue (overrides EVENT_QUEUE_CAPACITY)
    #[clap(long)]
    pub queue_capacity: Option<usize>,

    /// History kept per instrument, in seconds (overrides WINDOW_MAX_AGE_SECS)
    #[clap(long)]
    pub window_secs: Option<i64>,

    /// Emit JSON logs
    #[clap(long)]
    pub json_logs: bool,
}
