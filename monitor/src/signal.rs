use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A completed pattern. Created once per excursion and never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub instrument_id: String,
    pub current_value: f64,
    pub extreme_value: Option<f64>,
    pub change_ratio: Option<f64>,
    pub observed_at: Option<NaiveDateTime>,
}

/// Which pattern produced a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalLabel {
    BuyPoint,
    SellPoint,
    RallyExhaustion,
    RallyBegin,
    LimitTouch,
    LimitTouchFall,
}

impl SignalLabel {
    /// Evaluation order used by the manager.
    pub const ALL: [SignalLabel; 6] = [
        SignalLabel::BuyPoint,
        SignalLabel::SellPoint,
        SignalLabel::RallyExhaustion,
        SignalLabel::RallyBegin,
        SignalLabel::LimitTouch,
        SignalLabel::LimitTouchFall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalLabel::BuyPoint => "buy_point",
            SignalLabel::SellPoint => "sell_point",
            SignalLabel::RallyExhaustion => "rally_exhaustion",
            SignalLabel::RallyBegin => "rally_begin",
            SignalLabel::LimitTouch => "limit_touch",
            SignalLabel::LimitTouchFall => "limit_touch_fall",
        }
    }

    /// Event type under which signals of this label are published.
    pub fn as_event_type(&self) -> String {
        format!("signal.{}", self.as_str())
    }
}

impl fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
