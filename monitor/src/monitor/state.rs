use chrono::NaiveDateTime;

/// Coarse lifecycle of a monitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Monitoring,
    Notified,
}

/// Mutable state owned by exactly one monitor.
///
/// `extreme_value` is a running maximum or minimum depending on the kind;
/// it is only meaningful while `is_monitoring` is set.
#[derive(Clone, Debug, PartialEq)]
pub struct MonitorState {
    pub is_monitoring: bool,
    pub notified: bool,
    pub latest_observed_at: Option<NaiveDateTime>,
    pub extreme_value: f64,
}

impl MonitorState {
    pub(crate) fn new(extreme_seed: f64) -> Self {
        Self {
            is_monitoring: false,
            notified: false,
            latest_observed_at: None,
            extreme_value: extreme_seed,
        }
    }

    pub fn phase(&self) -> Phase {
        match (self.is_monitoring, self.notified) {
            (_, true) => Phase::Notified,
            (true, false) => Phase::Monitoring,
            (false, false) => Phase::Idle,
        }
    }

    /// A bar at or before the last one seen is a re-delivery.
    pub(crate) fn is_replay(&self, at: NaiveDateTime) -> bool {
        matches!(self.latest_observed_at, Some(prev) if at <= prev)
    }

    pub(crate) fn observe(&mut self, at: NaiveDateTime) {
        self.latest_observed_at = Some(at);
    }

    pub(crate) fn reset(&mut self, extreme_seed: f64) {
        self.is_monitoring = false;
        self.notified = false;
        self.extreme_value = extreme_seed;
    }

    /// Enter monitoring, or widen the running maximum.
    pub(crate) fn track_max(&mut self, value: f64) {
        if !self.is_monitoring {
            self.is_monitoring = true;
            self.extreme_value = value;
        } else if value > self.extreme_value {
            self.extreme_value = value;
        }
    }

    /// Enter monitoring, or widen the running minimum.
    pub(crate) fn track_min(&mut self, value: f64) {
        if !self.is_monitoring {
            self.is_monitoring = true;
            self.extreme_value = value;
        } else if value < self.extreme_value {
            self.extreme_value = value;
        }
    }
}

/// Values a kind hands back when it fires; the monitor stamps identity and time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Fired {
    pub current: f64,
    pub extreme: Option<f64>,
    pub ratio: Option<f64>,
}
