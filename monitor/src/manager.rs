//! MonitorManager
//!
//! Entry point for the strategy loop. Keeps one [`InstrumentMonitors`] per
//! instrument, built on first sight and kept for the life of the process,
//! and runs every monitor of that instrument against each new bar in a
//! fixed order.
//!
//! Callers must serialise `check` per instrument; `&mut self` enforces this
//! within one owner.

use std::collections::HashMap;

use tracing::trace;

use crate::monitor::{MonitorKind, MonitorState, SignalMonitor};
use crate::params::MonitorConfig;
use crate::signal::{Signal, SignalLabel};
use crate::tick::TickWindow;

/// Every monitor of one instrument.
#[derive(Clone, Debug)]
pub struct InstrumentMonitors {
    pub buy_point: SignalMonitor,
    pub sell_point: SignalMonitor,
    pub rally_exhaustion: SignalMonitor,
    pub rally_begin: SignalMonitor,
    pub limit_touch: SignalMonitor,
    pub limit_touch_fall: SignalMonitor,
}

impl InstrumentMonitors {
    pub fn new(instrument_id: &str, config: &MonitorConfig) -> Self {
        Self {
            buy_point: SignalMonitor::new(
                instrument_id,
                MonitorKind::PeakDrawdown,
                config.buy_point.clone(),
            ),
            sell_point: SignalMonitor::new(
                instrument_id,
                MonitorKind::ValleyBounce,
                config.sell_point.clone(),
            ),
            rally_exhaustion: SignalMonitor::new(
                instrument_id,
                MonitorKind::PeakDrawdown,
                config.rally_exhaustion.clone(),
            ),
            rally_begin: SignalMonitor::new(
                instrument_id,
                MonitorKind::ThresholdCross,
                config.rally_begin.clone(),
            ),
            limit_touch: SignalMonitor::new(
                instrument_id,
                MonitorKind::LimitTouch(config.limit_extra.clone()),
                config.limit.clone(),
            ),
            limit_touch_fall: SignalMonitor::new(
                instrument_id,
                MonitorKind::LimitTouchFall(config.limit_extra.clone()),
                config.limit.clone(),
            ),
        }
    }

    /// Monitors in evaluation order, paired with their labels.
    fn ordered_mut(&mut self) -> [(SignalLabel, &mut SignalMonitor); 6] {
        [
            (SignalLabel::BuyPoint, &mut self.buy_point),
            (SignalLabel::SellPoint, &mut self.sell_point),
            (SignalLabel::RallyExhaustion, &mut self.rally_exhaustion),
            (SignalLabel::RallyBegin, &mut self.rally_begin),
            (SignalLabel::LimitTouch, &mut self.limit_touch),
            (SignalLabel::LimitTouchFall, &mut self.limit_touch_fall),
        ]
    }

    fn ordered(&self) -> [(SignalLabel, &SignalMonitor); 6] {
        [
            (SignalLabel::BuyPoint, &self.buy_point),
            (SignalLabel::SellPoint, &self.sell_point),
            (SignalLabel::RallyExhaustion, &self.rally_exhaustion),
            (SignalLabel::RallyBegin, &self.rally_begin),
            (SignalLabel::LimitTouch, &self.limit_touch),
            (SignalLabel::LimitTouchFall, &self.limit_touch_fall),
        ]
    }
}

/// Registry of per-instrument monitors plus the fixed configuration they
/// are built from.
#[derive(Default)]
pub struct MonitorManager {
    config: MonitorConfig,
    registry: HashMap<String, InstrumentMonitors>,
}

impl MonitorManager {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            registry: HashMap::new(),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run every monitor of `instrument_id` against the latest bar of `frame`.
    ///
    /// Returns the signals fired by this bar in evaluation order. Monitor
    /// output is passed through untouched.
    pub fn check(&mut self, frame: &TickWindow, instrument_id: &str) -> Vec<(SignalLabel, Signal)> {
        let config = &self.config;
        let monitors = self
            .registry
            .entry(instrument_id.to_string())
            .or_insert_with(|| {
                trace!(instrument = instrument_id, "registering monitors");
                InstrumentMonitors::new(instrument_id, config)
            });

        monitors
            .ordered_mut()
            .into_iter()
            .filter_map(|(label, monitor)| monitor.evaluate(frame).map(|s| (label, s)))
            .collect()
    }

    /// Number of instruments seen so far.
    pub fn instruments(&self) -> usize {
        self.registry.len()
    }

    pub fn monitors(&self, instrument_id: &str) -> Option<&InstrumentMonitors> {
        self.registry.get(instrument_id)
    }

    /// State of every monitor of an instrument, in evaluation order.
    pub fn snapshot(&self, instrument_id: &str) -> Option<Vec<(SignalLabel, MonitorState)>> {
        let monitors = self.registry.get(instrument_id)?;
        Some(
            monitors
                .ordered()
                .into_iter()
                .map(|(label, m)| (label, m.state().clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::Phase;
    use crate::tick::Tick;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    fn at(min: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
            + TimeDelta::minutes(min)
    }

    fn quiet_bar(min: i64) -> Tick {
        Tick::new(at(min))
            .with("dz", 50.0)
            .with("sp", 1.0)
            .with("close", 10.0)
            .with("max_price", 11.0)
    }

    #[test]
    fn registers_lazily_and_once() {
        let mut mm = MonitorManager::default();
        assert_eq!(mm.instruments(), 0);
        assert!(mm.snapshot("600000").is_none());

        let w = TickWindow::from_rows([quiet_bar(0)]);
        mm.check(&w, "600000");
        mm.check(&w, "600000");
        mm.check(&w, "000001");

        assert_eq!(mm.instruments(), 2);
        let snap = mm.snapshot("600000").unwrap();
        let labels: Vec<_> = snap.iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, SignalLabel::ALL.to_vec());
    }

    #[test]
    fn state_persists_across_calls() {
        let mut mm = MonitorManager::default();
        let mut w = TickWindow::default();

        w.push(quiet_bar(0).with("dz", 95.0));
        assert!(mm.check(&w, "600000").is_empty());

        w.push(quiet_bar(1).with("dz", 88.0));
        let out = mm.check(&w, "600000");

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, SignalLabel::BuyPoint);
    }

    #[test]
    fn instruments_are_isolated() {
        let mut mm = MonitorManager::default();

        let mut a = TickWindow::default();
        let mut b = TickWindow::default();

        a.push(quiet_bar(0).with("dz", 95.0));
        b.push(quiet_bar(0).with("dz", 95.0));
        mm.check(&a, "A");
        mm.check(&b, "B");

        // A retraces, B carries a broken bar.
        a.push(quiet_bar(1).with("dz", 88.0));
        b.push(quiet_bar(1).with("dz", f64::NAN));

        assert_eq!(mm.check(&a, "A").len(), 1);
        assert!(mm.check(&b, "B").is_empty());

        let b_buy = &mm.snapshot("B").unwrap()[0].1;
        assert_eq!(b_buy.phase(), Phase::Monitoring);
        assert_eq!(b_buy.extreme_value, 95.0);
    }

    #[test]
    fn signals_come_back_in_fixed_order() {
        let mut mm = MonitorManager::default();
        let mut w = TickWindow::default();

        w.push(quiet_bar(0).with("dz", 100.0).with("sp", 4.0));
        mm.check(&w, "600000");

        // One bar that retraces both DZ and SP and touches the ceiling.
        w.push(
            quiet_bar(1)
                .with("dz", 94.0)
                .with("sp", 3.5)
                .with("close", 11.0),
        );
        let labels: Vec<_> = mm.check(&w, "600000").into_iter().map(|(l, _)| l).collect();

        assert_eq!(
            labels,
            vec![
                SignalLabel::BuyPoint,
                SignalLabel::RallyExhaustion,
                SignalLabel::LimitTouch,
            ]
        );
    }
}
