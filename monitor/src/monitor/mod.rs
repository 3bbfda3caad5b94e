mod limit;
mod peak;
mod state;
mod threshold;
mod valley;

pub use state::{MonitorState, Phase};

use chrono::NaiveDateTime;
use tracing::{debug, error};

use crate::error::MonitorError;
use crate::params::{LimitParams, MonitorParams};
use crate::signal::Signal;
use crate::tick::TickWindow;
use state::Fired;

/// The five pattern machines. Each shares [`MonitorState`]; the limit kinds
/// carry their hysteresis band.
#[derive(Clone, Debug, PartialEq)]
pub enum MonitorKind {
    PeakDrawdown,
    ValleyBounce,
    ThresholdCross,
    LimitTouch(LimitParams),
    LimitTouchFall(LimitParams),
}

impl MonitorKind {
    pub fn name(&self) -> &'static str {
        match self {
            MonitorKind::PeakDrawdown => "peak_drawdown",
            MonitorKind::ValleyBounce => "valley_bounce",
            MonitorKind::ThresholdCross => "threshold_cross",
            MonitorKind::LimitTouch(_) => "limit_touch",
            MonitorKind::LimitTouchFall(_) => "limit_touch_fall",
        }
    }

    /// Value the running extreme returns to on reset.
    fn extreme_seed(&self) -> f64 {
        match self {
            MonitorKind::PeakDrawdown => peak::SEED,
            MonitorKind::ValleyBounce => valley::SEED,
            MonitorKind::ThresholdCross => threshold::SEED,
            MonitorKind::LimitTouch(_) => limit::TOUCH_SEED,
            MonitorKind::LimitTouchFall(_) => limit::FALL_SEED,
        }
    }
}

/// One pattern machine for one instrument.
#[derive(Clone, Debug)]
pub struct SignalMonitor {
    instrument_id: String,
    kind: MonitorKind,
    params: MonitorParams,
    state: MonitorState,
}

impl SignalMonitor {
    pub fn new(instrument_id: impl Into<String>, kind: MonitorKind, params: MonitorParams) -> Self {
        let state = MonitorState::new(kind.extreme_seed());
        Self {
            instrument_id: instrument_id.into(),
            kind,
            params,
            state,
        }
    }

    pub fn instrument_id(&self) -> &str {
        &self.instrument_id
    }

    pub fn kind(&self) -> &MonitorKind {
        &self.kind
    }

    pub fn params(&self) -> &MonitorParams {
        &self.params
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Feed the latest bar of `frame` through the machine.
    ///
    /// Never fails: data errors are logged and the bar counts as silent,
    /// with state left exactly as it was.
    pub fn evaluate(&mut self, frame: &TickWindow) -> Option<Signal> {
        match self.try_evaluate(frame) {
            Ok(signal) => signal,
            Err(e) => {
                error!(
                    instrument = %self.instrument_id,
                    monitor = self.kind.name(),
                    error = %e,
                    "monitor evaluation failed; bar skipped"
                );
                None
            }
        }
    }

    /// Fallible core of [`evaluate`](Self::evaluate).
    ///
    /// All reads happen before the first state write, so an `Err` leaves the
    /// monitor untouched.
    pub fn try_evaluate(&mut self, frame: &TickWindow) -> Result<Option<Signal>, MonitorError> {
        let latest = frame.latest().ok_or(MonitorError::EmptyFrame)?;
        let at = latest.observed_at;

        if self.state.is_replay(at) {
            debug!(
                instrument = %self.instrument_id,
                monitor = self.kind.name(),
                %at,
                "bar already seen; skipping"
            );
            return Ok(None);
        }

        let column = self
            .params
            .source_column
            .as_deref()
            .ok_or(MonitorError::NoSourceColumn)?;

        let fired = match &self.kind {
            MonitorKind::PeakDrawdown => {
                let value = latest.value(column)?;
                self.state.observe(at);
                peak::step(&mut self.state, &self.params, value)
            }
            MonitorKind::ValleyBounce => {
                let value = latest.value(column)?;
                self.state.observe(at);
                valley::step(&mut self.state, &self.params, value)
            }
            MonitorKind::ThresholdCross => {
                let value = latest.value(column)?;
                self.state.observe(at);
                threshold::step(&mut self.state, &self.params, value)
            }
            MonitorKind::LimitTouch(band) => {
                let reading = limit::read(latest, column, band)?;
                self.state.observe(at);
                limit::step_touch(&mut self.state, band, reading)
            }
            MonitorKind::LimitTouchFall(band) => {
                let reading = limit::read_with_history(frame, latest, column, band)?;
                self.state.observe(at);
                limit::step_fall(&mut self.state, band, reading)
            }
        };

        Ok(fired.map(|f| self.stamp(f, at)))
    }

    fn stamp(&self, fired: Fired, at: NaiveDateTime) -> Signal {
        debug!(
            instrument = %self.instrument_id,
            monitor = self.kind.name(),
            current = fired.current,
            extreme = ?fired.extreme,
            ratio = ?fired.ratio,
            "signal fired"
        );

        Signal {
            instrument_id: self.instrument_id.clone(),
            current_value: fired.current,
            extreme_value: fired.extreme,
            change_ratio: fired.ratio,
            observed_at: Some(at),
        }
    }
}
