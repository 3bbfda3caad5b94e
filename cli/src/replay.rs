//! Strategy loop over a recorded tick stream.
//!
//! Per record:
//!   • append the tick to its instrument's window (filling the ceiling from
//!     `prev_close` when the feed did not supply one)
//!   • run the instrument's monitors
//!   • push one message per bar that fired, listing every label
//!   • publish one event per signal for other subscribers

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, warn};

use common::{TraceId, annotate_span, child_span, root_span};
use events::{Event, EventEngine};
use monitor::{MonitorManager, Signal, SignalLabel, Tick, TickWindow, board_ceiling};

use crate::notify::{Notifier, format_push_message};

/// Column the ceiling is derived from when absent.
pub const PREV_CLOSE_COLUMN: &str = "prev_close";

/// One line of the input stream.
#[derive(Debug, Clone, Deserialize)]
pub struct TickRecord {
    pub instrument: String,
    pub observed_at: NaiveDateTime,
    #[serde(default)]
    pub columns: HashMap<String, f64>,
}

/// Payload of every `signal.*` event.
#[derive(Debug, Serialize)]
pub struct SignalEvent<'a> {
    pub label: SignalLabel,
    #[serde(flatten)]
    pub signal: &'a Signal,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub ticks: usize,
    pub malformed: usize,
    pub signals: usize,
}

pub struct Replayer<N: Notifier> {
    manager: MonitorManager,
    windows: HashMap<String, TickWindow>,
    window_max_age: TimeDelta,
    engine: Arc<EventEngine>,
    notifier: Arc<N>,
}

impl<N: Notifier> Replayer<N> {
    pub fn new(
        manager: MonitorManager,
        window_max_age: TimeDelta,
        engine: Arc<EventEngine>,
        notifier: Arc<N>,
    ) -> Self {
        Self {
            manager,
            windows: HashMap::new(),
            window_max_age,
            engine,
            notifier,
        }
    }

    /// Replay every line of `reader`. Malformed lines are logged and skipped.
    pub async fn run<R: BufRead>(&mut self, reader: R) -> anyhow::Result<ReplaySummary> {
        let mut summary = ReplaySummary::default();

        for (lineno, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("reading line {}", lineno + 1))?;
            if line.trim().is_empty() {
                continue;
            }

            let record: TickRecord = match serde_json::from_str(&line) {
                Ok(r) => r,
                Err(e) => {
                    warn!(line = lineno + 1, error = %e, "malformed tick record; skipped");
                    summary.malformed += 1;
                    continue;
                }
            };

            summary.ticks += 1;
            summary.signals += self.on_tick(record).await.len();
        }

        Ok(summary)
    }

    /// Process one record and return what fired.
    pub async fn on_tick(&mut self, record: TickRecord) -> Vec<(SignalLabel, Signal)> {
        let trace_id = TraceId::default();
        let span = root_span("on_tick", &trace_id);

        async move {
            annotate_span(&record.instrument);

            let tick = self.build_tick(&record);
            let close = tick.value(&self.manager.config().limit_extra.price_column).ok();

            let max_age = self.window_max_age;
            let window = self
                .windows
                .entry(record.instrument.clone())
                .or_insert_with(|| TickWindow::new(max_age));
            window.push(tick);

            let signals = self.manager.check(window, &record.instrument);
            if signals.is_empty() {
                return signals;
            }

            self.notify(&record, close, &signals)
                .instrument(child_span("notify"))
                .await;
            child_span("publish").in_scope(|| self.publish(&signals));
            signals
        }
        .instrument(span)
        .await
    }

    fn build_tick(&self, record: &TickRecord) -> Tick {
        let mut tick = Tick {
            observed_at: record.observed_at,
            columns: record.columns.clone(),
        };

        let Some(ceiling_column) = self.manager.config().limit.source_column.as_deref() else {
            return tick;
        };

        if !tick.has(ceiling_column) {
            if let Ok(prev_close) = tick.value(PREV_CLOSE_COLUMN) {
                tick.set(ceiling_column, board_ceiling(&record.instrument, prev_close));
            }
        }

        tick
    }

    async fn notify(&self, record: &TickRecord, close: Option<f64>, signals: &[(SignalLabel, Signal)]) {
        let labels: Vec<SignalLabel> = signals.iter().map(|(l, _)| *l).collect();
        let price = close.unwrap_or(signals[0].1.current_value);
        let message = format_push_message(&labels, &record.instrument, price, record.observed_at);

        if let Err(e) = self.notifier.send(&message).await {
            warn!(error = ?e, "notification failed");
        }
    }

    fn publish(&self, signals: &[(SignalLabel, Signal)]) {
        for (label, signal) in signals {
            let payload = SignalEvent {
                label: *label,
                signal,
            };

            let event = match Event::with_payload(label.as_event_type(), &payload) {
                Ok(ev) => ev,
                Err(e) => {
                    warn!(%label, error = %e, "signal not serializable; event dropped");
                    continue;
                }
            };

            match self.engine.put(event) {
                Ok(()) => debug!(%label, "signal event queued"),
                Err(e) => warn!(%label, error = %e, "signal event not queued"),
            }
        }
    }
}
