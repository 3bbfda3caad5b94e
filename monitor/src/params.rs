use serde::{Deserialize, Serialize};

/// Threshold configuration shared by every monitor kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonitorParams {
    pub threshold: f64,
    pub percent: f64,
    pub source_column: Option<String>,
}

impl MonitorParams {
    pub fn new(threshold: f64, percent: f64, source_column: &str) -> Self {
        Self {
            threshold,
            percent,
            source_column: Some(source_column.to_string()),
        }
    }
}

/// Extra fields for the limit-touch kinds.
///
/// `MonitorParams::source_column` names the ceiling column; the traded
/// price is read from `price_column`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LimitParams {
    /// Fraction of the ceiling below which a touch is considered over.
    pub drawdown_percent: f64,
    pub price_column: String,
}

impl Default for LimitParams {
    fn default() -> Self {
        Self {
            drawdown_percent: DEFAULT_LIMIT_DRAWDOWN,
            price_column: "close".to_string(),
        }
    }
}

pub const DEFAULT_LIMIT_DRAWDOWN: f64 = 0.985;

/// Column names the default configuration reads.
pub const DZ_COLUMN: &str = "dz";
pub const SP_COLUMN: &str = "sp";
pub const CEILING_COLUMN: &str = "max_price";

/// Fixed per-pattern configuration applied to every instrument.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Peak then drawdown on DZ.
    pub buy_point: MonitorParams,
    /// Valley then bounce on DZ.
    pub sell_point: MonitorParams,
    /// Peak then drawdown on SP.
    pub rally_exhaustion: MonitorParams,
    /// First cross above the SP threshold.
    pub rally_begin: MonitorParams,
    pub limit: MonitorParams,
    pub limit_extra: LimitParams,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            buy_point: MonitorParams::new(90.0, 0.05, DZ_COLUMN),
            sell_point: MonitorParams::new(-5.0, 0.05, DZ_COLUMN),
            rally_exhaustion: MonitorParams::new(3.0, 0.015, SP_COLUMN),
            rally_begin: MonitorParams::new(3.0, 0.0, SP_COLUMN),
            limit: MonitorParams::new(0.0, 0.0, CEILING_COLUMN),
            limit_extra: LimitParams::default(),
        }
    }
}
