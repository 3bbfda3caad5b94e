//! Per-instrument price-action monitors.
//!
//! A [`MonitorManager`] owns one set of state machines per instrument and
//! feeds each new bar ([`TickWindow`]) through them in a fixed order. Every
//! machine fires at most once per excursion and re-arms on its own reset
//! condition.

pub mod ceiling;
pub mod error;
pub mod manager;
pub mod monitor;
pub mod params;
pub mod signal;
pub mod tick;

pub use ceiling::board_ceiling;
pub use error::MonitorError;
pub use manager::{InstrumentMonitors, MonitorManager};
pub use monitor::{MonitorKind, MonitorState, Phase, SignalMonitor};
pub use params::{LimitParams, MonitorConfig, MonitorParams};
pub use signal::{Signal, SignalLabel};
pub use tick::{DEFAULT_MAX_AGE_SECS, Tick, TickWindow};
