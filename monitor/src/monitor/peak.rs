//! Peak then drawdown.
//!
//! Arms when the value reaches the threshold, tracks the running peak, and
//! fires once the value has retraced `percent` of that peak. Falling below
//! the threshold disarms.

use super::state::{Fired, MonitorState};
use crate::params::MonitorParams;

pub(crate) const SEED: f64 = 0.0;

pub(crate) fn step(state: &mut MonitorState, params: &MonitorParams, value: f64) -> Option<Fired> {
    if value < params.threshold {
        state.reset(SEED);
        return None;
    }

    state.track_max(value);

    if state.notified {
        return None;
    }

    let peak = state.extreme_value;
    // A zero peak yields NaN, which never satisfies the comparison below.
    let drawdown = (peak - value) / peak;

    if drawdown >= params.percent {
        state.notified = true;
        return Some(Fired {
            current: value,
            extreme: Some(peak),
            ratio: Some(drawdown),
        });
    }

    None
}
