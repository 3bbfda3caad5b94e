//! Ceiling-price monitors.
//!
//! The touch monitor fires the first time the close reaches the ceiling and
//! stays silent until the close drops below `ceiling * drawdown_percent`.
//! The fall monitor is its companion: it fires once the close has dropped
//! out of that band after an earlier touch in the window, and re-arms on the
//! next touch.

use super::state::{Fired, MonitorState};
use crate::error::MonitorError;
use crate::params::LimitParams;
use crate::tick::{Tick, TickWindow};

pub(crate) const TOUCH_SEED: f64 = 0.0;
pub(crate) const FALL_SEED: f64 = f64::INFINITY;

/// Values read from the latest bar (and, for the fall monitor, the history).
#[derive(Clone, Copy, Debug)]
pub(crate) struct LimitReading {
    pub close: f64,
    pub ceiling: f64,
    pub touched_before: bool,
}

impl LimitReading {
    fn touching(&self) -> bool {
        self.close >= self.ceiling
    }

    fn below_band(&self, limit: &LimitParams) -> bool {
        self.close < self.ceiling * limit.drawdown_percent
    }
}

pub(crate) fn read(
    latest: &Tick,
    ceiling_column: &str,
    limit: &LimitParams,
) -> Result<LimitReading, MonitorError> {
    let close = latest.value(&limit.price_column)?;
    let ceiling = latest.value(ceiling_column)?;

    if ceiling <= 0.0 {
        return Err(MonitorError::InvalidCeiling { value: ceiling });
    }

    Ok(LimitReading {
        close,
        ceiling,
        touched_before: false,
    })
}

/// Like [`read`], plus a scan of the earlier rows for a close at or above
/// today's ceiling. Rows missing the price column are not touches.
pub(crate) fn read_with_history(
    frame: &TickWindow,
    latest: &Tick,
    ceiling_column: &str,
    limit: &LimitParams,
) -> Result<LimitReading, MonitorError> {
    let mut reading = read(latest, ceiling_column, limit)?;

    reading.touched_before = frame
        .history()
        .filter_map(|row| row.value(&limit.price_column).ok())
        .any(|close| close >= reading.ceiling);

    Ok(reading)
}

pub(crate) fn step_touch(
    state: &mut MonitorState,
    limit: &LimitParams,
    r: LimitReading,
) -> Option<Fired> {
    if !r.touching() {
        if r.below_band(limit) {
            state.reset(TOUCH_SEED);
        }
        return None;
    }

    state.track_max(r.close);

    if state.notified {
        return None;
    }

    state.notified = true;
    Some(Fired {
        current: r.close,
        extreme: Some(r.ceiling),
        ratio: None,
    })
}

pub(crate) fn step_fall(
    state: &mut MonitorState,
    limit: &LimitParams,
    r: LimitReading,
) -> Option<Fired> {
    if r.touching() {
        state.reset(FALL_SEED);
        return None;
    }

    if !r.touched_before || !r.below_band(limit) {
        return None;
    }

    state.track_min(r.close);

    if state.notified {
        return None;
    }

    state.notified = true;
    Some(Fired {
        current: r.close,
        extreme: Some(r.ceiling),
        ratio: Some((r.ceiling - r.close) / r.ceiling),
    })
}
