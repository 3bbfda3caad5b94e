//! Threshold crossing.
//!
//! Fires on the first bar strictly above the threshold. The signal reports
//! the threshold as its extreme and a zero ratio. The post-cross maximum is
//! still tracked for diagnostics. Only a value strictly below the threshold
//! disarms; sitting exactly on it holds the current phase.

use super::state::{Fired, MonitorState};
use crate::params::MonitorParams;

pub(crate) const SEED: f64 = 0.0;

pub(crate) fn step(state: &mut MonitorState, params: &MonitorParams, value: f64) -> Option<Fired> {
    if value < params.threshold {
        state.reset(SEED);
        return None;
    }

    if value == params.threshold {
        return None;
    }

    state.track_max(value);

    if state.notified {
        return None;
    }

    state.notified = true;
    Some(Fired {
        current: value,
        extreme: Some(params.threshold),
        ratio: Some(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(values: &[f64]) -> (MonitorState, Vec<Option<Fired>>) {
        let params = MonitorParams::new(3.0, 0.0, "sp");
        let mut state = MonitorState::new(SEED);
        let out = values.iter().map(|v| step(&mut state, &params, *v)).collect();
        (state, out)
    }

    #[test]
    fn fires_once_on_strict_cross() {
        let (state, out) = run(&[2.0, 3.0, 3.5, 4.0, 3.2]);

        assert!(out[1].is_none(), "touching the threshold is not a cross");
        let fired = out[2].unwrap();
        assert_eq!(fired.extreme, Some(3.0));
        assert_eq!(fired.ratio, Some(0.0));
        assert!(out[3].is_none() && out[4].is_none());
        assert_eq!(state.extreme_value, 4.0);
    }

    #[test]
    fn sitting_on_threshold_does_not_rearm() {
        let (_, out) = run(&[3.5, 3.0, 3.5]);

        assert!(out[0].is_some());
        assert!(out[2].is_none());
    }

    #[test]
    fn falling_below_rearms() {
        let (_, out) = run(&[3.5, 2.9, 3.5]);

        assert!(out[0].is_some());
        assert!(out[2].is_some());
    }
}
