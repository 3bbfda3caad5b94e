//! Valley then bounce, the mirror of [`super::peak`].
//!
//! The bounce is compared as an absolute ratio because the default
//! threshold is negative and the trough therefore has a negative sign.
//! A zero trough falls back to the absolute difference.

use super::state::{Fired, MonitorState};
use crate::params::MonitorParams;

pub(crate) const SEED: f64 = f64::INFINITY;

pub(crate) fn step(state: &mut MonitorState, params: &MonitorParams, value: f64) -> Option<Fired> {
    if value > params.threshold {
        state.reset(SEED);
        return None;
    }

    state.track_min(value);

    if state.notified {
        return None;
    }

    let trough = state.extreme_value;
    let bounce = if trough == 0.0 {
        (value - trough).abs()
    } else {
        ((value - trough) / trough).abs()
    };

    if bounce >= params.percent {
        state.notified = true;
        return Some(Fired {
            current: value,
            extreme: Some(trough),
            ratio: Some(bounce),
        });
    }

    None
}
