use thiserror::Error;

/// Data errors raised while reading a bar.
///
/// These never leave a monitor: `SignalMonitor::evaluate` logs them and
/// treats the bar as producing no signal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    #[error("tick window is empty")]
    EmptyFrame,

    #[error("monitor has no source column configured")]
    NoSourceColumn,

    #[error("column `{column}` missing from tick")]
    MissingColumn { column: String },

    #[error("column `{column}` is not a finite number: {value}")]
    NonFinite { column: String, value: f64 },

    #[error("ceiling price must be positive, got {value}")]
    InvalidCeiling { value: f64 },
}
